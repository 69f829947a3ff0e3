//! Free-text search helpers.
//!
//! A search query is matched twice: as a prefix `tsquery` against the
//! concatenated `tsvector` of the searchable columns, and as a substring
//! `ILIKE` against each column individually.

/// Characters with meaning in `to_tsquery` syntax.
const TSQUERY_OPERATORS: &[char] = &['&', '|', '!', '(', ')', ':', '*', '<', '>', '\'', '\\'];

/// Converts user input into `to_tsquery` text: prefix-matching terms joined with `|`.
///
/// Returns `None` when no usable term survives sanitizing.
#[must_use]
pub fn to_tsquery_text(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|token| token.replace(TSQUERY_OPERATORS, ""))
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(|token| format!("{token}:*"))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" | "))
    }
}

/// Builds a case-insensitive substring pattern with `LIKE` wildcards escaped.
#[must_use]
pub fn ilike_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsquery_joins_terms_with_or() {
        assert_eq!(
            to_tsquery_text("rack  west").as_deref(),
            Some("rack:* | west:*")
        );
    }

    #[test]
    fn test_tsquery_strips_operators() {
        assert_eq!(
            to_tsquery_text("a&b !(ready)").as_deref(),
            Some("ab:* | ready:*")
        );
        assert_eq!(to_tsquery_text("'quoted':*").as_deref(), Some("quoted:*"));
    }

    #[test]
    fn test_tsquery_empty_inputs() {
        assert!(to_tsquery_text("").is_none());
        assert!(to_tsquery_text("   ").is_none());
        assert!(to_tsquery_text("& | !").is_none());
        assert!(to_tsquery_text("-- ..").is_none());
    }

    #[test]
    fn test_tsquery_keeps_punctuation_inside_terms() {
        assert_eq!(
            to_tsquery_text("10.0.0.0 host-1").as_deref(),
            Some("10.0.0.0:* | host-1:*")
        );
    }

    #[test]
    fn test_ilike_pattern_escapes_wildcards() {
        assert_eq!(ilike_pattern("ready"), "%ready%");
        assert_eq!(ilike_pattern(" 100%_done "), "%100\\%\\_done%");
        assert_eq!(ilike_pattern("a\\b"), "%a\\\\b%");
    }
}
