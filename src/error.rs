use thiserror::Error;

/// Which input dataset a column check failed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("Mode must be 'exact' or 'fuzzy', got '{mode}'")]
    InvalidMode { mode: String },
    #[error("Column '{column}' not found in {side} dataset")]
    MissingColumn { column: String, side: Side },
    #[error("Composite key '{spec}' must name exactly two columns separated by '|'")]
    InvalidCompositeKey { spec: String },
    #[error("Threshold {threshold} is outside 0-100")]
    InvalidThreshold { threshold: f64 },
    #[error("Rows per output unit must be greater than zero")]
    InvalidUnitSize,
}
