/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 50;

/// Derives a segment key from heading text.
///
/// Punctuation and bullet glyphs are removed, the rest is trimmed, lowercased
/// and whitespace runs become a single underscore. Pure and deterministic.
pub fn slugify(heading: &str) -> String {
    let kept: String = heading
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    let slug = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    let capped: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let capped = capped.trim_matches('_');
    if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped.to_string()
    }
}
