use serde::Serialize;

use crate::{dataset::Dataset, engine::Reconciliation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub left_rows: usize,
    pub right_rows: usize,
    pub matched: usize,
    pub left_anomalies: usize,
    pub right_anomalies: usize,
    /// `matched / max(left_rows, right_rows) * 100`, two decimals; 0 when
    /// both inputs are empty.
    pub matching_rate: f64,
}

pub fn summarize(
    left_rows: usize,
    right_rows: usize,
    matched: usize,
    left_anomalies: usize,
    right_anomalies: usize,
) -> Summary {
    let denominator = left_rows.max(right_rows);
    let matching_rate = if denominator == 0 {
        0.0
    } else {
        round2(matched as f64 / denominator as f64 * 100.0)
    };
    Summary {
        left_rows,
        right_rows,
        matched,
        left_anomalies,
        right_anomalies,
        matching_rate,
    }
}

impl Summary {
    pub fn from_reconciliation(left: &Dataset, right: &Dataset, result: &Reconciliation) -> Self {
        summarize(
            left.len(),
            right.len(),
            result.matched.len(),
            result.left_only.len(),
            result.right_only.len(),
        )
    }

    /// Label/value pairs in display order.
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Total Left", self.left_rows as f64),
            ("Total Right", self.right_rows as f64),
            ("Matched", self.matched as f64),
            ("Anomaly Left", self.left_anomalies as f64),
            ("Anomaly Right", self.right_anomalies as f64),
            ("Matching Rate (%)", self.matching_rate),
        ]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rate_uses_larger_side() {
        let summary = summarize(10, 8, 6, 4, 2);
        assert_eq!(summary.matching_rate, 60.0);
        assert_eq!(summarize(8, 10, 6, 2, 4).matching_rate, 60.0);
    }

    #[test]
    fn matching_rate_rounds_to_two_decimals() {
        assert_eq!(summarize(3, 3, 2, 1, 1).matching_rate, 66.67);
        assert_eq!(summarize(3, 3, 1, 2, 2).matching_rate, 33.33);
    }

    #[test]
    fn empty_inputs_report_zero_rate() {
        let summary = summarize(0, 0, 0, 0, 0);
        assert_eq!(summary.matching_rate, 0.0);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.metrics()[5], ("Matching Rate (%)", 0.0));
    }
}
