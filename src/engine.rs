//! Reconciliation of two datasets against a join key.
//!
//! Every row is reduced to a normalized key (see [`crate::normalize`]), then
//! joined either on key equality or on the best fuzzy match for each left
//! key. The result partitions row indices of both inputs into matched pairs,
//! left-only rows and right-only rows; the input datasets are only borrowed.

use std::{collections::HashMap, fmt, str::FromStr};

use log::debug;
use serde::Serialize;

use crate::{
    dataset::Dataset,
    error::{ReconcileError, Side},
    fuzzy::{self, DEFAULT_THRESHOLD, FuzzyMatch},
    normalize::KeySpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

impl FromStr for MatchMode {
    type Err = ReconcileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "exact" => Ok(MatchMode::Exact),
            "fuzzy" => Ok(MatchMode::Fuzzy),
            other => Err(ReconcileError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => f.write_str("exact"),
            MatchMode::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    pub key: KeySpec,
    pub mode: MatchMode,
    /// Minimum fuzzy score (0-100). Ignored in exact mode.
    pub threshold: f64,
    /// Pair repeated exact keys positionally (k-th left with k-th right)
    /// instead of joining every left duplicate to every right duplicate.
    pub duplicate_aware: bool,
}

impl ReconcileOptions {
    pub fn new(key: KeySpec, mode: MatchMode) -> Self {
        Self {
            key,
            mode,
            threshold: DEFAULT_THRESHOLD,
            duplicate_aware: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_duplicate_aware(mut self, enabled: bool) -> Self {
        self.duplicate_aware = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub left: usize,
    pub right: usize,
    /// Similarity of the two keys; `None` for exact matches.
    pub score: Option<f64>,
}

/// The three-way partition produced by [`reconcile`], expressed as row
/// indices into the input datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub mode: MatchMode,
    pub left_keys: Vec<String>,
    pub right_keys: Vec<String>,
    pub matched: Vec<MatchedPair>,
    pub left_only: Vec<usize>,
    pub right_only: Vec<usize>,
}

impl Reconciliation {
    /// Key the left row of `pair` was joined on (the chosen right key in
    /// fuzzy mode).
    pub fn matched_key(&self, pair: &MatchedPair) -> &str {
        &self.right_keys[pair.right]
    }
}

pub fn reconcile(
    left: &Dataset,
    right: &Dataset,
    options: &ReconcileOptions,
) -> Result<Reconciliation, ReconcileError> {
    if !(0.0..=100.0).contains(&options.threshold) {
        return Err(ReconcileError::InvalidThreshold {
            threshold: options.threshold,
        });
    }
    let left_keys = options.key.keys(left, Side::Left)?;
    let right_keys = options.key.keys(right, Side::Right)?;

    let mut lookup = RightLookup::build(&right_keys);
    debug!(
        "Reconciling {} left row(s) against {} right row(s) across {} distinct right key(s)",
        left_keys.len(),
        right_keys.len(),
        lookup.distinct.len()
    );

    let mut matched = Vec::new();
    let mut left_only = Vec::new();
    match options.mode {
        MatchMode::Exact if options.duplicate_aware => {
            let mut occurrences: HashMap<&str, usize> = HashMap::new();
            for (row, key) in left_keys.iter().enumerate() {
                let occurrence = occurrences.entry(key.as_str()).or_insert(0);
                let paired = lookup.nth(key, *occurrence);
                *occurrence += 1;
                match paired {
                    Some(right_row) => matched.push(MatchedPair {
                        left: row,
                        right: right_row,
                        score: None,
                    }),
                    None => left_only.push(row),
                }
            }
        }
        MatchMode::Exact => {
            for (row, key) in left_keys.iter().enumerate() {
                if !lookup.join(row, key, None, &mut matched) {
                    left_only.push(row);
                }
            }
        }
        MatchMode::Fuzzy => {
            if options.duplicate_aware {
                debug!("Duplicate-aware pairing applies to exact mode only; ignoring");
            }
            let mut cache: HashMap<&str, Option<FuzzyMatch>> = HashMap::new();
            for (row, key) in left_keys.iter().enumerate() {
                let found = *cache.entry(key.as_str()).or_insert_with(|| {
                    fuzzy::best_match(
                        key,
                        &lookup.distinct,
                        &fuzzy::token_sort_ratio,
                        options.threshold,
                    )
                });
                let joined = match found {
                    Some(hit) => {
                        let chosen = lookup.distinct[hit.index];
                        lookup.join(row, chosen, Some(hit.score), &mut matched)
                    }
                    None => false,
                };
                if !joined {
                    left_only.push(row);
                }
            }
            debug!("Fuzzy search evaluated {} distinct left key(s)", cache.len());
        }
    }

    let right_only = lookup
        .used
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(row, _)| row)
        .collect::<Vec<_>>();

    Ok(Reconciliation {
        mode: options.mode,
        left_keys,
        right_keys,
        matched,
        left_only,
        right_only,
    })
}

/// Right rows grouped by key, in original order, with a per-row used flag.
struct RightLookup<'a> {
    buckets: HashMap<&'a str, Vec<usize>>,
    /// Distinct keys in order of first appearance.
    distinct: Vec<&'a str>,
    used: Vec<bool>,
}

impl<'a> RightLookup<'a> {
    fn build(keys: &'a [String]) -> Self {
        let mut buckets: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut distinct = Vec::new();
        for (row, key) in keys.iter().enumerate() {
            let bucket = buckets.entry(key.as_str()).or_default();
            if bucket.is_empty() {
                distinct.push(key.as_str());
            }
            bucket.push(row);
        }
        Self {
            buckets,
            distinct,
            used: vec![false; keys.len()],
        }
    }

    /// Pairs `left_row` with every right row carrying `key`.
    fn join(
        &mut self,
        left_row: usize,
        key: &str,
        score: Option<f64>,
        matched: &mut Vec<MatchedPair>,
    ) -> bool {
        let Some(bucket) = self.buckets.get(key) else {
            return false;
        };
        for &right_row in bucket {
            self.used[right_row] = true;
            matched.push(MatchedPair {
                left: left_row,
                right: right_row,
                score,
            });
        }
        !bucket.is_empty()
    }

    /// Claims the `occurrence`-th right row carrying `key`, if any.
    fn nth(&mut self, key: &str, occurrence: usize) -> Option<usize> {
        let right_row = *self.buckets.get(key)?.get(occurrence)?;
        self.used[right_row] = true;
        Some(right_row)
    }
}
