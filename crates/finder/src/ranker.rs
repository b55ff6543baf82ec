// Chunk: docs/chunks/fuzzy_file_matcher - Path ranking
//!
//! Ranks candidate paths against a query.
//!
//! Each candidate is scored twice: against its bare filename and against the
//! full relative path. The better of the two wins (the filename on ties), a
//! length penalty of one point per ten characters favours shallower paths,
//! and the survivors are sorted by descending score and truncated.

use crate::fuzzy_scorer::{self, ScoredMatch};

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Final score (higher is better). May be negative.
    pub score: i64,
    /// `char` offsets into `path`, one per query character.
    pub matched_indices: Vec<usize>,
}

/// Characters of path length that cost one point.
const LENGTH_PENALTY_DIVISOR: usize = 10;

/// Scores every candidate against `query` and returns the best `max_results`.
///
/// An empty query yields no results; what an empty query should display is
/// the caller's decision. Order among equal scores is unspecified.
pub fn rank<S: AsRef<str>>(query: &str, candidates: &[S], max_results: usize) -> Vec<MatchResult> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<MatchResult> = candidates
        .iter()
        .filter_map(|candidate| rank_one(query, candidate.as_ref()))
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(max_results);
    results
}

/// Scores a single path, or `None` if neither its filename nor full path match.
fn rank_one(query: &str, path: &str) -> Option<MatchResult> {
    let filename = filename_of(path);
    let path_len = path.chars().count();
    let offset = path_len - filename.chars().count();

    let by_filename = fuzzy_scorer::score(query, filename).map(|m| ScoredMatch {
        score: m.score,
        matched_indices: m.matched_indices.into_iter().map(|i| i + offset).collect(),
    });
    let by_path = fuzzy_scorer::score(query, path);

    let best = match (by_filename, by_path) {
        (Some(f), Some(p)) => {
            if f.score >= p.score {
                f
            } else {
                p
            }
        }
        (Some(f), None) => f,
        (None, Some(p)) => p,
        (None, None) => return None,
    };

    let penalty = (path_len / LENGTH_PENALTY_DIVISOR) as i64;
    Some(MatchResult {
        path: path.to_string(),
        score: best.score - penalty,
        matched_indices: best.matched_indices,
    })
}

/// The component after the last `/`, or the whole path.
fn filename_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    }
}
