// Text layout: font selection, sanitizing and word-wrap.
// Pure functions only; drawing lives in `render`.

pub mod font_metrics;
pub mod sanitize;
pub mod wrap;
