//! OLS / WLS kernels for a complete (no-missing) response block.
//!
//! Given `Y` (n × m) and `X` (m × k), one call to [`fit_block`] computes
//!
//! - coefficients `B` (n × k)
//! - fitted values `B·Xᵀ` (n × m)
//! - residuals `Y - B·Xᵀ` (n × m), multiplied column-wise by `sqrt(w_j)` when
//!   weights are given
//!
//! The public operations are thin selectors over that single fit.
//!
//! The kernel does not check that m > k. With the default solve strategy a
//! rank-deficient design surfaces as `FitError::SingularMatrix`; callers that
//! must not fail (the row-wise drivers) check the observation count first.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitConfig, FitSummary};
use crate::error::{FitError, Result};
use crate::math::solve_coefficients;

/// Everything computed by one kernel call.
#[derive(Debug, Clone)]
pub struct BlockFit {
    pub coefficients: DMatrix<f64>,
    pub fitted: DMatrix<f64>,
    /// Raw residuals for OLS; `sqrt(w)`-scaled residuals for WLS.
    pub residuals: DMatrix<f64>,
}

/// Fit every row of `y` against the shared design `x`.
pub fn fit_block(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: Option<&DVector<f64>>,
    config: &FitConfig,
) -> Result<BlockFit> {
    check_block_shapes(y, x, w)?;

    let coefficients = solve_coefficients(config, y, x, w)?;
    let fitted = &coefficients * x.transpose();
    let mut residuals = y - &fitted;

    if let Some(w) = w {
        for (j, &wj) in w.iter().enumerate() {
            residuals.column_mut(j).scale_mut(wj.sqrt());
        }
    }

    Ok(BlockFit {
        coefficients,
        fitted,
        residuals,
    })
}

pub fn fit_residuals(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_block(y, x, None, config)?.residuals)
}

pub fn fit_predicted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_block(y, x, None, config)?.fitted)
}

/// WLS residuals, reported in `sqrt(w)`-scaled units.
pub fn fit_residuals_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DVector<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_block(y, x, Some(w), config)?.residuals)
}

/// WLS fitted values (unscaled).
pub fn fit_predicted_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DVector<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_block(y, x, Some(w), config)?.fitted)
}

/// OLS coefficients plus residual degrees of freedom.
pub fn fit(y: &DMatrix<f64>, x: &DMatrix<f64>, config: &FitConfig) -> Result<FitSummary> {
    summarize(y, x, None, config)
}

/// WLS coefficients plus residual degrees of freedom.
pub fn fit_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DVector<f64>,
    config: &FitConfig,
) -> Result<FitSummary> {
    summarize(y, x, Some(w), config)
}

fn summarize(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: Option<&DVector<f64>>,
    config: &FitConfig,
) -> Result<FitSummary> {
    check_block_shapes(y, x, w)?;

    let (m, k) = x.shape();
    if m < k {
        return Err(FitError::InsufficientObservations { needed: k, got: m });
    }
    let df_residual = m - k;

    let block = fit_block(y, x, w, config)?;
    let residual_variance = DVector::from_iterator(
        block.residuals.nrows(),
        block.residuals.row_iter().map(|r| {
            if df_residual == 0 {
                f64::NAN
            } else {
                r.norm_squared() / df_residual as f64
            }
        }),
    );

    Ok(FitSummary {
        coefficients: block.coefficients,
        df_residual,
        residual_variance,
    })
}

fn check_block_shapes(y: &DMatrix<f64>, x: &DMatrix<f64>, w: Option<&DVector<f64>>) -> Result<()> {
    if x.nrows() != y.ncols() {
        return Err(FitError::DimensionMismatch {
            what: "design rows vs response columns",
            expected: y.ncols(),
            got: x.nrows(),
        });
    }
    if let Some(w) = w {
        if w.len() != y.ncols() {
            return Err(FitError::DimensionMismatch {
                what: "weights vs response columns",
                expected: y.ncols(),
                got: w.len(),
            });
        }
    }
    Ok(())
}
