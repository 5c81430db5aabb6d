//! Approximate key matching.
//!
//! Scores are on a 0-100 scale. [`token_sort_ratio`] sorts the whitespace
//! separated tokens of both inputs before comparing them with an indel
//! (insert/delete only) edit distance, so token order never affects the score.

use itertools::Itertools;
use similar::{Algorithm, DiffOp, capture_diff_slices};

pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Similarity function used by [`best_match`].
pub trait Scorer {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, query: &str, candidate: &str) -> f64 {
        self(query, candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    /// Position of the winning candidate in the slice passed to [`best_match`].
    pub index: usize,
    pub score: f64,
}

/// `100 * 2 * lcs / (len(a) + len(b))`, computed over characters.
pub fn ratio(a: &str, b: &str) -> f64 {
    let old = a.chars().collect::<Vec<_>>();
    let new = b.chars().collect::<Vec<_>>();
    let total = old.len() + new.len();
    if total == 0 {
        return 100.0;
    }
    let common: usize = capture_diff_slices(Algorithm::Myers, &old, &new)
        .iter()
        .map(|op| match op {
            DiffOp::Equal { len, .. } => *len,
            _ => 0,
        })
        .sum();
    (200 * common) as f64 / total as f64
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(value: &str) -> String {
    value.split_whitespace().sorted_unstable().join(" ")
}

/// Best scoring candidate for `query`, accepted only when its score is at
/// least `threshold`. An empty query never matches. When several candidates
/// share the top score the earliest one wins.
pub fn best_match<C, S>(query: &str, candidates: &[C], scorer: &S, threshold: f64) -> Option<FuzzyMatch>
where
    C: AsRef<str>,
    S: Scorer + ?Sized,
{
    if query.is_empty() {
        return None;
    }
    let mut best: Option<FuzzyMatch> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = scorer.score(query, candidate.as_ref());
        if best.is_none_or(|current| score > current.score) {
            best = Some(FuzzyMatch { index, score });
        }
    }
    best.filter(|found| found.score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_counts_common_characters() {
        assert_eq!(ratio("ABCD", "ABCD"), 100.0);
        assert_eq!(ratio("ABCD", "ABCE"), 75.0);
        assert_eq!(ratio("ABC", "XYZ"), 0.0);
        assert_eq!(ratio("ABC", ""), 0.0);
    }

    #[test]
    fn token_sort_ratio_ignores_token_order() {
        assert_eq!(token_sort_ratio("ACME WIDGETS", "WIDGETS ACME"), 100.0);
        assert_eq!(token_sort_ratio("  ACME   WIDGETS ", "WIDGETS ACME"), 100.0);
        assert!(token_sort_ratio("ACME WIDGETS", "ACME GADGETS") < 100.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let candidates = ["ABCE"];
        let accepted = best_match("ABCD", &candidates, &token_sort_ratio, 75.0);
        assert_eq!(accepted, Some(FuzzyMatch { index: 0, score: 75.0 }));
        assert_eq!(best_match("ABCD", &candidates, &token_sort_ratio, 76.0), None);
    }

    #[test]
    fn empty_query_and_empty_candidates_never_match() {
        let candidates = ["", "ABC"];
        assert_eq!(best_match("", &candidates, &token_sort_ratio, 0.0), None);
        let none: [&str; 0] = [];
        assert_eq!(best_match("ABC", &none, &token_sort_ratio, 0.0), None);
    }

    #[test]
    fn ties_resolve_to_first_candidate() {
        let candidates = ["ABCX", "ABCY", "ABCD"];
        let found = best_match("ABCZ", &candidates, &token_sort_ratio, 50.0).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.score, 75.0);
    }

    #[test]
    fn custom_scorer_is_honoured() {
        let exact_only = |a: &str, b: &str| if a == b { 100.0 } else { 0.0 };
        let candidates = ["ACME", "ACMEINC"];
        let found = best_match("ACMEINC", &candidates, &exact_only, 100.0).unwrap();
        assert_eq!(found.index, 1);
    }
}
