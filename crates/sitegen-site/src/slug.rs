//! Title to slug normalization.

/// Normalize a menu title into a path segment.
///
/// Lowercases, turns spaces into underscores and drops apostrophes:
/// `"What's On"` becomes `"whats_on"`. Everything else is kept as is.
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .filter(|&c| c != '\'')
        .flat_map(char::to_lowercase)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Whether a slug can be used as a single path segment.
pub(crate) fn is_usable(slug: &str) -> bool {
    !slug.is_empty() && slug != "." && slug != ".." && !slug.contains(['/', '\\'])
}
