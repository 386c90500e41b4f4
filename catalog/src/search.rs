//! Category search: query tokenization and candidate matching
//!
//! A query is percent-decoded, split on single spaces and stripped of the `&`
//! connector. A category path is a candidate when any term is a prefix of a
//! word inside it (OR across terms). Precision comes entirely from
//! [`crate::ranking`], which re-scores every candidate from scratch.

use std::collections::HashSet;

use percent_encoding::percent_decode_str;

use crate::candidate::Candidate;
use crate::models::CategoryPath;

/// Query words that only decorate category labels ("Antiques & Collectibles")
/// and would match nearly every path.
const CONNECTOR_TOKENS: &[&str] = &["&"];

/// Default number of results when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 10;

/// A single lowercased query word. Never empty, never a connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Returns `None` for tokens that must not take part in matching.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || CONNECTOR_TOKENS.contains(&trimmed) {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Turn a raw (possibly percent-encoded) query into ordered, de-duplicated terms.
pub fn tokenize_query(raw_query: &str) -> Vec<SearchTerm> {
    let decoded = percent_decode_str(raw_query).decode_utf8_lossy();

    let mut seen = HashSet::new();
    decoded
        .split(' ')
        .filter_map(SearchTerm::new)
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Keep the paths that at least one term hits at a word start.
/// An empty term set yields no candidates.
pub fn find_candidates(
    terms: &[SearchTerm],
    corpus: impl IntoIterator<Item = CategoryPath>,
) -> Vec<Candidate> {
    if terms.is_empty() {
        return Vec::new();
    }
    corpus
        .into_iter()
        .map(Candidate::new)
        .filter(|c| c.matches_any(terms))
        .collect()
}
