//! Depth-aware relevance ranking for category search.
//!
//! Segments are walked leaf-first. A segment at reversed index `idx` with `m`
//! word-start hits contributes `(2 * (m + 1))^idx`; the rank score is the sum.
//! Lower scores sort first, so hits near the leaf are cheap and hits near the
//! root inflate the score. The leaf (`idx = 0`) always contributes exactly 1,
//! whatever its hit count.
//!
//! Ties on score are broken by display name so the order is deterministic.

use std::cmp::Ordering;

use regex::Regex;

use crate::candidate::Candidate;
use crate::interface::{CatalogError, RankedResult};
use crate::models::{CategoryPath, SEGMENT_DELIMITER};
use crate::search::SearchTerm;

/// Combined word-start matcher for a whole term set.
///
/// Each term matches at the start of a segment or right after a space or
/// segment delimiter. Within a single segment only the first two can occur.
#[derive(Debug, Clone)]
pub struct RankPattern {
    regex: Option<Regex>,
}

impl RankPattern {
    /// Fails with `InvalidInput` when the term set is too large to compile.
    pub fn new(terms: &[SearchTerm]) -> Result<Self, CatalogError> {
        if terms.is_empty() {
            return Ok(Self { regex: None });
        }
        let delimiter = regex::escape(&SEGMENT_DELIMITER.to_string());
        let alternatives: Vec<String> = terms
            .iter()
            .map(|t| {
                let t = regex::escape(t.as_str());
                format!("^{t}|[{delimiter} ]{t}")
            })
            .collect();
        let regex = Regex::new(&alternatives.join("|")).map_err(|e| {
            CatalogError::InvalidInput(format!("query with {} terms is too large: {}", terms.len(), e))
        })?;
        Ok(Self { regex: Some(regex) })
    }

    /// Number of non-overlapping hits in an already lowercased segment.
    pub fn count_hits(&self, segment_lower: &str) -> usize {
        match &self.regex {
            Some(re) => re.find_iter(segment_lower).count(),
            None => 0,
        }
    }
}

/// Contribution of one segment at reversed index `idx` with `hits` matches.
fn segment_contribution(idx: usize, hits: usize) -> f64 {
    let base = 2.0 * (hits as f64 + 1.0);
    base.powi(idx as i32)
}

/// Rank score of a path; lower is better.
pub fn rank_score(path: &CategoryPath, pattern: &RankPattern) -> f64 {
    path.segments()
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, segment)| {
            let hits = pattern.count_hits(&segment.to_lowercase());
            segment_contribution(idx, hits)
        })
        .sum()
}

/// Total order over results: score ascending, then display name ascending.
pub fn compare_results(a: &RankedResult, b: &RankedResult) -> Ordering {
    a.rank_score
        .total_cmp(&b.rank_score)
        .then_with(|| a.display_name.cmp(&b.display_name))
}

/// Score every candidate and return them in rank order.
pub fn rank_candidates(candidates: Vec<Candidate>, pattern: &RankPattern) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = candidates
        .into_iter()
        .map(|c| {
            let path = c.into_path();
            RankedResult {
                rank_score: rank_score(&path, pattern),
                display_name: path.render(),
                external_id: path.id().to_string(),
            }
        })
        .collect();
    results.sort_by(compare_results);
    results
}
