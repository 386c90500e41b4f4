//! Search candidate with memoized derived state.
//!
//! Module isolation ensures no code outside this module can mutate `path`
//! after construction, so the `OnceLock` cache can never go stale.

use std::sync::OnceLock;

use crate::models::{CategoryPath, SEGMENT_DELIMITER};
use crate::search::SearchTerm;

/// A category path under consideration for a query.
/// `internal_lower()` is computed on first access and cached.
#[derive(Debug, Clone)]
pub struct Candidate {
    path: CategoryPath,
    internal_lower: OnceLock<String>,
}

impl Candidate {
    pub fn new(path: CategoryPath) -> Self {
        Self {
            path,
            internal_lower: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &CategoryPath {
        &self.path
    }

    pub fn into_path(self) -> CategoryPath {
        self.path
    }

    /// Lowercased internal form (segments joined by the storage delimiter)
    pub fn internal_lower(&self) -> &str {
        self.internal_lower
            .get_or_init(|| self.path.internal().to_lowercase())
    }

    /// Whether `term` is a prefix of some word in the path. Words start at the
    /// beginning of the path, after a space, or after a segment delimiter.
    pub fn matches_term(&self, term: &SearchTerm) -> bool {
        let haystack = self.internal_lower();
        word_starts(haystack).any(|start| haystack[start..].starts_with(term.as_str()))
    }

    pub fn matches_any(&self, terms: &[SearchTerm]) -> bool {
        terms.iter().any(|t| self.matches_term(t))
    }
}

/// Byte offsets at which a word starts.
fn word_starts(s: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        s.char_indices()
            .filter(|&(_, c)| c == ' ' || c == SEGMENT_DELIMITER)
            .map(|(i, c)| i + c.len_utf8()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str) -> Candidate {
        Candidate::new(CategoryPath::from_stored("TST000000", path).unwrap())
    }

    fn term(s: &str) -> SearchTerm {
        SearchTerm::new(s).unwrap()
    }

    #[test]
    fn test_internal_lower_is_cached_form() {
        let c = candidate("Science|History");
        assert_eq!(c.internal_lower(), "science|history");
    }

    #[test]
    fn test_match_at_path_start() {
        assert!(candidate("History|Ancient|Rome").matches_term(&term("his")));
    }

    #[test]
    fn test_match_after_space() {
        assert!(candidate("Body, Mind & Spirit|Magick Studies").matches_term(&term("stud")));
    }

    #[test]
    fn test_match_after_delimiter() {
        assert!(candidate("Science|History").matches_term(&term("his")));
    }

    #[test]
    fn test_mid_word_does_not_match() {
        // "prehistoric" contains "his" but not at a word start
        assert!(!candidate("Science|Prehistoric").matches_term(&term("his")));
        assert!(!candidate("Antiques & Collectibles|General").matches_term(&term("que")));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(candidate("FICTION|ROMANCE").matches_term(&term("Rom")));
    }

    #[test]
    fn test_trailing_delimiter_position_has_no_word() {
        // A word start at the very end of the haystack can only match an empty term,
        // and terms are never empty.
        assert!(!candidate("Science History").matches_term(&term("historyx")));
    }

    #[test]
    fn test_matches_any_is_or() {
        let c = candidate("Juvenile Fiction / Fantasy & Magic");
        assert!(c.matches_any(&[term("zzz"), term("fant")]));
        assert!(!c.matches_any(&[term("zzz"), term("yyy")]));
        assert!(!c.matches_any(&[]));
    }
}
