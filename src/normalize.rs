//! Key normalization and composite keys.
//!
//! A key is the canonical form of a cell: upper-cased with every character
//! that is not an ASCII letter or digit removed. Missing cells normalize to
//! the empty string. Composite keys join two normalized parts with
//! [`COMPOSITE_SEPARATOR`], which normalization can never produce.

use std::fmt;

use crate::{
    dataset::{CellValue, Dataset},
    error::{ReconcileError, Side},
};

pub const COMPOSITE_SEPARATOR: char = '|';

pub fn normalize(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        other => normalize_str(&other.as_display()),
    }
}

pub fn normalize_str(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// `normalize(first) | normalize(second)` for one row. Both columns must
/// already be resolved against the dataset.
pub fn composite_key(dataset: &Dataset, row: usize, first: usize, second: usize) -> String {
    let mut key = normalize(dataset.cell(row, first));
    key.push(COMPOSITE_SEPARATOR);
    key.push_str(&normalize(dataset.cell(row, second)));
    key
}

/// The join column requested by the caller: a real column, or the virtual
/// column formed from two underlying columns (`Company|NPP`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    Column(String),
    Composite { first: String, second: String },
}

impl KeySpec {
    pub fn parse(value: &str) -> Result<Self, ReconcileError> {
        if !value.contains(COMPOSITE_SEPARATOR) {
            return Ok(KeySpec::Column(value.to_string()));
        }
        let parts = value.split(COMPOSITE_SEPARATOR).collect::<Vec<_>>();
        match parts.as_slice() {
            [first, second] if !first.trim().is_empty() && !second.trim().is_empty() => {
                Ok(KeySpec::Composite {
                    first: first.trim().to_string(),
                    second: second.trim().to_string(),
                })
            }
            _ => Err(ReconcileError::InvalidCompositeKey {
                spec: value.to_string(),
            }),
        }
    }

    pub fn composite(first: impl Into<String>, second: impl Into<String>) -> Self {
        KeySpec::Composite {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn columns(&self) -> Vec<&str> {
        match self {
            KeySpec::Column(name) => vec![name.as_str()],
            KeySpec::Composite { first, second } => vec![first.as_str(), second.as_str()],
        }
    }

    /// File-name friendly label: lower-cased, separator replaced by `_`.
    pub fn slug(&self) -> String {
        self.to_string()
            .to_lowercase()
            .replace(COMPOSITE_SEPARATOR, "_")
    }

    /// Checks every underlying column exists in `dataset`.
    pub fn validate(&self, dataset: &Dataset, side: Side) -> Result<(), ReconcileError> {
        for column in self.columns() {
            if !dataset.has_column(column) {
                return Err(ReconcileError::MissingColumn {
                    column: column.to_string(),
                    side,
                });
            }
        }
        Ok(())
    }

    /// Derives the key of every row in `dataset`, in row order.
    pub fn keys(&self, dataset: &Dataset, side: Side) -> Result<Vec<String>, ReconcileError> {
        let index_of = |name: &str| {
            dataset
                .column_index(name)
                .ok_or_else(|| ReconcileError::MissingColumn {
                    column: name.to_string(),
                    side,
                })
        };
        let keys = match self {
            KeySpec::Column(name) => {
                let idx = index_of(name)?;
                (0..dataset.len())
                    .map(|row| normalize(dataset.cell(row, idx)))
                    .collect()
            }
            KeySpec::Composite { first, second } => {
                let first = index_of(first)?;
                let second = index_of(second)?;
                (0..dataset.len())
                    .map(|row| composite_key(dataset, row, first, second))
                    .collect()
            }
        };
        Ok(keys)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Column(name) => f.write_str(name),
            KeySpec::Composite { first, second } => {
                write!(f, "{first}{COMPOSITE_SEPARATOR}{second}")
            }
        }
    }
}
