//! URL-safe slugs derived from human titles.

/// Derive a slug: lowercase ASCII alphanumerics, with every run of other
/// characters collapsed into a single `-` and no leading or trailing `-`.
///
/// Pure and idempotent: `derive_slug(&derive_slug(s)) == derive_slug(s)`.
#[must_use]
pub fn derive_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}
