//! URL slugs for categories created without one.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase ASCII slug: runs of anything else collapse to `-`, trimmed.
///
/// Returns an empty string when `name` has no ASCII alphanumerics.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    SEPARATORS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// True if `slug` is already in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
