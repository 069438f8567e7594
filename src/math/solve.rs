//! Least-squares coefficient solvers.
//!
//! Every kernel in this crate reduces to the same problem. Given a response
//! block `Y` (n × m), a design block `X` (m × k) and optional observation
//! weights `w` (length m), find the coefficient block `B` (n × k) minimizing
//!
//! ```text
//! Σ_i Σ_j w_j (Y_ij - (B·Xᵀ)_ij)^2
//! ```
//!
//! Each response row is an independent regression sharing the same design.
//!
//! Implementation choices:
//! - `NormalEquations` is the closed form `B = Y·W·X·(Xᵀ·W·X)⁻¹`. It is what
//!   the row-wise drivers use by default because k is tiny (an intercept and a
//!   few covariates), but it refuses a singular cross-product and is not
//!   numerically robust.
//! - `SvdSolver` scales rows of `X` and columns of `Y` by `sqrt(w_j)` and solves
//!   the resulting ordinary least-squares problem with SVD, which also handles
//!   collinear designs.

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::domain::{FitConfig, SolveStrategy};
use crate::error::{FitError, Result};

/// Upper bound on SVD sweeps.
const SVD_MAX_ITER: usize = 500;

/// A strategy for computing the coefficient block `B` (n × k).
///
/// Callers guarantee `y.ncols() == x.nrows()` and, when present,
/// `w.len() == x.nrows()`.
pub trait Solver {
    fn coefficients(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: Option<&DVector<f64>>,
    ) -> Result<DMatrix<f64>>;
}

/// `Y·W·X·(Xᵀ·W·X)⁻¹`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalEquations;

impl Solver for NormalEquations {
    fn coefficients(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: Option<&DVector<f64>>,
    ) -> Result<DMatrix<f64>> {
        if x.ncols() == 0 {
            return Ok(DMatrix::zeros(y.nrows(), 0));
        }

        // Xᵀ·W: scale column j (observation j) by w_j.
        let mut xt_w = x.transpose();
        if let Some(w) = w {
            for (j, &wj) in w.iter().enumerate() {
                xt_w.column_mut(j).scale_mut(wj);
            }
        }

        let gram = &xt_w * x;
        let gram_inv = gram.try_inverse().ok_or(FitError::SingularMatrix)?;

        Ok(y * xt_w.transpose() * gram_inv)
    }
}

/// Minimum-norm least squares via SVD of the `sqrt(w)`-scaled system.
#[derive(Debug, Clone, Copy)]
pub struct SvdSolver {
    /// Singular values at or below this threshold are treated as zero.
    pub tolerance: f64,
}

impl Solver for SvdSolver {
    fn coefficients(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: Option<&DVector<f64>>,
    ) -> Result<DMatrix<f64>> {
        if x.ncols() == 0 {
            return Ok(DMatrix::zeros(y.nrows(), 0));
        }

        let mut xs = x.clone();
        let mut yt = y.transpose();
        if let Some(w) = w {
            for (j, &wj) in w.iter().enumerate() {
                let sw = wj.sqrt();
                xs.row_mut(j).scale_mut(sw);
                yt.row_mut(j).scale_mut(sw);
            }
        }

        // nalgebra's SVD panics on non-finite input. A NaN weight or design
        // entry yields NaN coefficients instead, as the normal equations do.
        if !xs.iter().all(|v| v.is_finite()) {
            trace!("svd solve: non-finite scaled design, coefficients set to NaN");
            return Ok(DMatrix::from_element(y.nrows(), x.ncols(), f64::NAN));
        }

        let svd = xs
            .try_svd(true, true, f64::EPSILON, SVD_MAX_ITER)
            .ok_or_else(|| FitError::Numerical("SVD did not converge".to_string()))?;

        trace!(
            "svd solve: {} observations, {} regressors, rank {}",
            x.nrows(),
            x.ncols(),
            svd.rank(self.tolerance)
        );

        // Solves Xs·β = Ysᵀ column by column; β is k × n.
        let beta = svd
            .solve(&yt, self.tolerance)
            .map_err(|e| FitError::Numerical(e.to_string()))?;

        Ok(beta.transpose())
    }
}

/// Solve for the coefficient block with the strategy selected in `config`.
pub fn solve_coefficients(
    config: &FitConfig,
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: Option<&DVector<f64>>,
) -> Result<DMatrix<f64>> {
    match config.strategy {
        SolveStrategy::Inverse => NormalEquations.coefficients(y, x, w),
        SolveStrategy::Svd => SvdSolver {
            tolerance: config.svd_tolerance,
        }
        .coefficients(y, x, w),
    }
}
