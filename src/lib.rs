//! `rowfit` library crate.
//!
//! Ordinary and weighted least-squares residuals and fitted values for many
//! response rows against a shared design matrix, with per-row handling of
//! missing (NaN) responses.
//!
//! - `math`: missing-value detection and the pluggable least-squares solve
//! - `fit`: complete-block kernels, the row-wise driver and the unchecked batch driver
//! - `api`: `Fitter` plus free functions using the default configuration
//!
//! ```
//! use nalgebra::DMatrix;
//! use rowfit::{NA, fit_residuals_rowwise};
//!
//! let y = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, NA]);
//! let x = DMatrix::from_element(3, 1, 1.0); // intercept only
//!
//! let resid = fit_residuals_rowwise(&y, &x).unwrap();
//! assert!((resid[(1, 0)] + 0.5).abs() < 1e-12);
//! assert!(resid[(1, 2)].is_nan());
//! ```

pub mod api;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;

pub use api::*;
pub use domain::{FitConfig, FitSummary, SolveStrategy};
pub use error::{FitError, Result};
pub use fit::{RowFit, RowOutput, RowWeights, RowwiseOutput};
pub use math::{NA, count_missing, is_missing, is_na, valid_column_indices};
