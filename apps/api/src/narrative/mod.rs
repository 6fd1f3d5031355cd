// Narrative segment parser: heading-structured rich text → addressable
// key → (title, body) mapping.

pub mod handlers;
pub mod segments;
pub mod slug;
