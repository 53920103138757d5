//! Header ids derived from header text.
//!
//! A derived id is the header's alphanumeric words, lowercased and joined by
//! single hyphens. Id references fall back to the same derivation, so
//! `` `Getting Started`_ `` reaches the header `Getting Started`.

/// Derive a target id from `text`. Empty when `text` has no alphanumeric
/// characters; such headers register no id.
pub fn slugify(text: &str) -> String {
    return text
        .split(|c: char| return !c.is_alphanumeric())
        .filter(|word| return !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
}
