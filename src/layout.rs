//! Shapes a [`Reconciliation`] into output tables.
//!
//! Matched rows place the left columns first, then the right columns, then
//! the join key. Columns present on both sides get `_left` / `_right`
//! suffixes. Fuzzy runs also report the chosen right key and its score.
//! Anomaly tables keep their own side's columns plus the join key.

use std::collections::HashSet;

use crate::{
    dataset::{CellValue, Dataset},
    engine::{MatchMode, MatchedPair, Reconciliation},
    normalize::KeySpec,
};

pub const KEY_COLUMN: &str = "_key";
pub const MATCHED_KEY_COLUMN: &str = "_matched_key";
pub const SCORE_COLUMN: &str = "_score";

pub const SUMMARY_SHEET: &str = "Summary";
pub const MATCHED_SHEET_BASE: &str = "Data_Matched";
pub const LEFT_ANOMALY_SHEET: &str = "AnomalyLeft";
pub const RIGHT_ANOMALY_SHEET: &str = "AnomalyRight";

/// `reconciliation_<column>_<mode>.xlsx`, column lower-cased with the
/// composite separator replaced by `_`.
pub fn default_output_name(key: &KeySpec, mode: MatchMode) -> String {
    format!("reconciliation_{}_{}.xlsx", key.slug(), mode)
}

/// Output columns of a matched table. Data columns that would repeat a name
/// already used (including the trailing key columns) get `_2`, `_3`, ...
pub fn matched_headers(left: &Dataset, right: &Dataset, mode: MatchMode) -> Vec<String> {
    let left_names = left.headers.iter().collect::<HashSet<_>>();
    let right_names = right.headers.iter().collect::<HashSet<_>>();
    let trailing = match mode {
        MatchMode::Exact => vec![KEY_COLUMN],
        MatchMode::Fuzzy => vec![KEY_COLUMN, MATCHED_KEY_COLUMN, SCORE_COLUMN],
    };
    let mut taken = trailing.iter().map(|name| name.to_string()).collect::<HashSet<_>>();
    let mut headers = Vec::with_capacity(left.headers.len() + right.headers.len() + trailing.len());
    for name in &left.headers {
        headers.push(claim(suffixed(name, right_names.contains(name), "_left"), &mut taken));
    }
    for name in &right.headers {
        headers.push(claim(suffixed(name, left_names.contains(name), "_right"), &mut taken));
    }
    headers.extend(trailing.into_iter().map(String::from));
    headers
}

fn suffixed(name: &str, collides: bool, suffix: &str) -> String {
    if collides {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    }
}

/// Returns `name`, or the first free `name_<n>` (n >= 2) when it is taken.
fn claim(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

pub fn matched_row(
    left: &Dataset,
    right: &Dataset,
    result: &Reconciliation,
    pair: &MatchedPair,
) -> Vec<CellValue> {
    let mut row = Vec::with_capacity(left.headers.len() + right.headers.len() + 3);
    row.extend((0..left.headers.len()).map(|col| left.cell(pair.left, col).clone()));
    row.extend((0..right.headers.len()).map(|col| right.cell(pair.right, col).clone()));
    row.push(key_cell(&result.left_keys[pair.left]));
    if result.mode == MatchMode::Fuzzy {
        row.push(key_cell(result.matched_key(pair)));
        row.push(pair.score.map(CellValue::Number).unwrap_or_default());
    }
    row
}

pub fn side_headers(dataset: &Dataset) -> Vec<String> {
    let mut taken = HashSet::from([KEY_COLUMN.to_string()]);
    let mut headers = dataset
        .headers
        .iter()
        .map(|name| claim(name.clone(), &mut taken))
        .collect::<Vec<_>>();
    headers.push(KEY_COLUMN.to_string());
    headers
}

pub fn side_row(dataset: &Dataset, keys: &[String], row: usize) -> Vec<CellValue> {
    let mut values = dataset.rows.get(row).cloned().unwrap_or_default();
    values.resize(dataset.headers.len(), CellValue::Empty);
    values.push(key_cell(&keys[row]));
    values
}

fn key_cell(key: &str) -> CellValue {
    CellValue::from_raw(key)
}
