//! Pagination defaults and free-text search helpers for listing endpoints.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page size for project and submission listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page a client may request.
pub const MAX_PAGE_LIMIT: i64 = 500;

/// Autocomplete lookups always return at most this many values.
pub const LOOKUP_LIMIT: i64 = 10;

/// Clamp a user-provided limit to `[1, max]`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// LIKE patterns
// ---------------------------------------------------------------------------

/// Trim a search term, treating blank input as no search at all.
pub fn normalize_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

/// `ILIKE` pattern matching `term` anywhere in the value.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// `ILIKE` pattern matching values that start with `term`.
pub fn prefix_pattern(term: &str) -> String {
    format!("{}%", escape_like(term))
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
///
/// PostgreSQL's default escape character is the backslash.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 10);
    }

    #[test]
    fn clamp_limit_respects_bounds() {
        assert_eq!(clamp_limit(Some(10_000), 10, 500), 500);
        assert_eq!(clamp_limit(Some(0), 10, 500), 1);
        assert_eq!(clamp_limit(Some(-3), 10, 500), 1);
        assert_eq!(clamp_limit(Some(25), 10, 500), 25);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }

    #[test]
    fn blank_terms_are_dropped() {
        assert_eq!(normalize_term(None), None);
        assert_eq!(normalize_term(Some("   ")), None);
        assert_eq!(normalize_term(Some(" main ")), Some("main"));
    }

    #[test]
    fn patterns_escape_wildcards() {
        assert_eq!(contains_pattern("main"), "%main%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(prefix_pattern("N"), "N%");
        assert_eq!(prefix_pattern("a\\b"), "a\\\\b%");
    }
}
