// Chunk: docs/chunks/fuzzy_file_matcher - Greedy subsequence scorer
//!
//! Scores a lower-cased query against one candidate string.
//!
//! Matching is a single greedy left-to-right pass: each query character takes
//! the first case-insensitive occurrence at or after the cursor. This is not
//! an optimal subsequence search, and rankings users rely on depend on that,
//! so later (possibly better-scoring) alignments are never considered.
//!
//! Per matched character:
//!
//! | contribution                                   | points |
//! |------------------------------------------------|--------|
//! | base                                           | +1     |
//! | directly follows the previous match            | +4     |
//! | preceded by `/`, `.`, `-` or `_`               | +3     |
//! | uppercase after a non-uppercase character      | +2     |
//! | at target position 0                           | +5     |
//!
//! Every unmatched character scanned after the first match costs 1 point, so
//! longer gaps cost more. Characters skipped before the first match are free.
//!
//! Indices are `char` offsets into the target, not byte offsets.

const BASE_SCORE: i64 = 1;
const CONSECUTIVE_BONUS: i64 = 4;
const WORD_BOUNDARY_BONUS: i64 = 3;
const CAMEL_CASE_BONUS: i64 = 2;
const START_BONUS: i64 = 5;
const GAP_PENALTY: i64 = 1;

/// Characters that start a new "word" inside a path.
const WORD_SEPARATORS: [char; 4] = ['/', '.', '-', '_'];

/// A successful match of a query against one target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMatch {
    pub score: i64,
    /// One strictly increasing `char` offset per query character.
    pub matched_indices: Vec<usize>,
}

/// Scores `query` against `target`.
///
/// Both sides are folded to their first lowercase char before comparing, so
/// callers pass the query as typed. Bonuses inspect the original casing of
/// `target`.
///
/// Returns `None` when the query is empty or when the target runs out before
/// every query character has been consumed.
pub fn score(query: &str, target: &str) -> Option<ScoredMatch> {
    let query: Vec<char> = query.chars().map(fold).collect();
    if query.is_empty() {
        return None;
    }
    let target: Vec<char> = target.chars().collect();

    let mut matched_indices = Vec::with_capacity(query.len());
    let mut score = 0;
    let mut cursor = 0;

    for &qc in &query {
        loop {
            let &tc = target.get(cursor)?;
            if fold(tc) == qc {
                break;
            }
            if !matched_indices.is_empty() {
                score -= GAP_PENALTY;
            }
            cursor += 1;
        }

        score += char_bonus(&target, cursor, matched_indices.last().copied());
        matched_indices.push(cursor);
        cursor += 1;
    }

    Some(ScoredMatch {
        score,
        matched_indices,
    })
}

/// Points earned by a match at `index`, given the previous match position.
fn char_bonus(target: &[char], index: usize, previous: Option<usize>) -> i64 {
    let mut bonus = BASE_SCORE;

    if index == 0 {
        return bonus + START_BONUS;
    }

    if previous == Some(index - 1) {
        bonus += CONSECUTIVE_BONUS;
    }

    let before = target[index - 1];
    if WORD_SEPARATORS.contains(&before) {
        bonus += WORD_BOUNDARY_BONUS;
    }
    if target[index].is_uppercase() && !before.is_uppercase() {
        bonus += CAMEL_CASE_BONUS;
    }

    bonus
}

/// Case-folds a single character for comparison.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(query: &str, target: &str) -> Vec<usize> {
        score(query, target).unwrap().matched_indices
    }

    #[test]
    fn test_empty_query_is_no_match() {
        assert_eq!(score("", "main.rs"), None);
    }

    #[test]
    fn test_missing_char_is_no_match() {
        assert_eq!(score("xyz", "main.rs"), None);
    }

    #[test]
    fn test_out_of_order_is_no_match() {
        assert_eq!(score("ba", "ab"), None);
    }

    #[test]
    fn test_single_char_at_start() {
        // base + start
        assert_eq!(score("m", "main").unwrap().score, 6);
    }

    #[test]
    fn test_consecutive_run() {
        // m: 1 + 5, a: 1 + 4, i: 1 + 4, n: 1 + 4
        let m = score("main", "main").unwrap();
        assert_eq!(m.score, 21);
        assert_eq!(m.matched_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_word_boundary_bonus() {
        // 'm' after '/': base + boundary, no gap penalty before the first match
        assert_eq!(score("m", "src/main").unwrap().score, 4);
        assert_eq!(score("m", "src_main").unwrap().score, 4);
        assert_eq!(score("m", "src-main").unwrap().score, 4);
        assert_eq!(score("m", "src.main").unwrap().score, 4);
    }

    #[test]
    fn test_camel_case_bonus_uses_target_casing() {
        // 'b' in "fooBar" is uppercase after lowercase 'o'
        assert_eq!(score("b", "fooBar").unwrap().score, 3);
        // same position, no transition
        assert_eq!(score("b", "foobar").unwrap().score, 1);
        // uppercase after uppercase gets nothing
        assert_eq!(score("b", "FOOBAR").unwrap().score, 1);
    }

    #[test]
    fn test_gap_penalty_per_scanned_char() {
        // a: 1 + 5, then 3 skipped chars, b: 1
        assert_eq!(score("ab", "axxxb").unwrap().score, 6 - 3 + 1);
        // longer gap costs more
        let short = score("ab", "axb").unwrap().score;
        let long = score("ab", "axxxxxb").unwrap().score;
        assert!(long < short);
    }

    #[test]
    fn test_no_penalty_before_first_match() {
        assert_eq!(score("b", "xxxxb").unwrap().score, 1);
    }

    #[test]
    fn test_greedy_first_occurrence() {
        // The optimal alignment would be the trailing "ab"; greedy takes the first.
        assert_eq!(indices("ab", "aXbXab"), vec![0, 2]);
    }

    #[test]
    fn test_case_insensitive_outcome() {
        for target in ["README.md", "src/Main.go", "FooBarBaz.rs", "x"] {
            for query in ["MA", "ma", "Rd", "fbb", "q"] {
                assert_eq!(
                    score(query, target).is_some(),
                    score(&query.to_lowercase(), target).is_some(),
                    "query {query:?} target {target:?}"
                );
            }
        }
    }

    #[test]
    fn test_indices_strictly_increasing_and_complete() {
        let cases = [
            ("mago", "src/main.go"),
            ("fbb", "FooBarBaz.rs"),
            ("aaa", "banana_a"),
            ("sr", "src/lib/src.rs"),
        ];
        for (query, target) in cases {
            let m = score(query, target).unwrap();
            assert_eq!(m.matched_indices.len(), query.chars().count());
            assert!(m.matched_indices.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_indices_are_char_offsets() {
        // 'é' is two bytes but one char
        assert_eq!(indices("b", "éb"), vec![1]);
    }
}
