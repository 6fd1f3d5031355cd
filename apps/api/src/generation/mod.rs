// Result document generation: the assembler, its error taxonomy, output
// naming and the HTTP handlers in front of it.

pub mod assembler;
pub mod error;
pub mod handlers;
pub mod paths;
