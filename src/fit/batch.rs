//! Weighted residuals for complete data, without missing-value handling.
//!
//! The caller guarantees that `Y`, `X` and `W` contain no missing entries and
//! that every row has more observations than regressors. Each row is fitted on
//! all of its columns and its residuals are assigned straight into the output
//! row: there is no valid-subset selection and no NaN fallback. A NaN input
//! simply propagates into that row's output, and a rank-deficient design is
//! reported by the solver for the whole call.

use log::debug;
use nalgebra::{DMatrix, RowDVector};
use rayon::prelude::*;

use crate::domain::FitConfig;
use crate::error::{FitError, Result};
use crate::fit::kernel::fit_block;

pub fn fit_residuals_batch_unchecked(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    config.validate()?;
    if x.nrows() != y.ncols() {
        return Err(FitError::DimensionMismatch {
            what: "design rows vs response columns",
            expected: y.ncols(),
            got: x.nrows(),
        });
    }
    if w.shape() != y.shape() {
        return Err(FitError::DimensionMismatch {
            what: "weight cells vs response cells",
            expected: y.len(),
            got: w.len(),
        });
    }

    let (n, p) = y.shape();
    debug!("batch WLS residuals: {n} rows, {p} columns, {} regressors", x.ncols());

    let eval = |i: usize| -> Result<RowDVector<f64>> {
        let y_row = y.rows(i, 1).into_owned();
        let w_row = w.row(i).transpose();
        let block = fit_block(&y_row, x, Some(&w_row), config).map_err(|e| e.in_row(i))?;
        Ok(block.residuals.row(0).into_owned())
    };

    let outcomes: Vec<Result<RowDVector<f64>>> = if config.parallel {
        (0..n).into_par_iter().map(eval).collect()
    } else {
        (0..n).map(eval).collect()
    };
    let rows = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

    let mut out = DMatrix::zeros(n, p);
    for (i, row) in rows.iter().enumerate() {
        out.set_row(i, row);
    }
    Ok(out)
}
