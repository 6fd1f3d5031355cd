pub mod generation;
pub mod source;
pub mod template;
