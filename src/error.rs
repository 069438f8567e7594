//! Error type shared by the kernels and drivers.
//!
//! Rows with too few valid observations are *not* errors: the row-wise drivers
//! skip them and leave NaN in the output. Everything here is a failure of the
//! whole call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("dimension mismatch ({what}): expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Xᵀ·W·X is singular and cannot be inverted")]
    SingularMatrix,

    #[error("insufficient observations: need at least {needed}, got {got}")]
    InsufficientObservations { needed: usize, got: usize },

    #[error("least-squares solve failed: {0}")]
    Numerical(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<FitError>,
    },
}

impl FitError {
    /// Attach the response row index to an error raised while fitting that row.
    pub fn in_row(self, row: usize) -> Self {
        FitError::Row {
            row,
            source: Box::new(self),
        }
    }
}

pub type Result<T, E = FitError> = std::result::Result<T, E>;
