//! Row-wise, missing-value-aware fitting.
//!
//! For a response matrix `Y` (n × p) and a shared design `X` (p × k), each
//! response row `i` is fitted on its own valid subset:
//!
//! 1. `ids` = ascending indices of the non-missing entries of `Y[i, ..]`
//! 2. if `ids.len() > k`: fit `Y[i, ids]` against `X[ids, ..]` (and weights
//!    `W[i, ids]`), then write the result to `out[i, ids]`
//! 3. otherwise the row is underrank and skipped
//!
//! The output starts as all-NaN, so missing inputs and skipped rows stay NaN.
//! Per-row results are carried as [`RowFit`] and only turned into NaN when
//! scattered.
//!
//! Rows share nothing, so they are evaluated in parallel when
//! `FitConfig::parallel` is set.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::FitConfig;
use crate::error::{FitError, Result};
use crate::fit::kernel::fit_block;
use crate::math::{NA, valid_column_indices};

/// Which kernel output is scattered into the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutput {
    /// `Y - fitted` (scaled by `sqrt(w)` in the weighted variant).
    Residuals,
    Fitted,
}

/// Observation weights for the row-wise drivers.
#[derive(Debug, Clone, Copy)]
pub enum RowWeights<'a> {
    Unweighted,
    /// One weight per (row, column) of `Y`.
    PerCell(&'a DMatrix<f64>),
}

/// Outcome of fitting a single response row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFit {
    Fitted {
        /// Valid column indices, ascending.
        columns: Vec<usize>,
        /// One value per entry of `columns`.
        values: Vec<f64>,
    },
    /// Too few valid observations for the number of regressors.
    Skipped,
}

/// Result of a row-wise run.
#[derive(Debug, Clone)]
pub struct RowwiseOutput {
    /// n × p; NaN wherever nothing was computed.
    pub values: DMatrix<f64>,
    /// Rows left entirely NaN because they were underrank.
    pub skipped_rows: Vec<usize>,
}

/// Fit every row of `y` on its valid subset and scatter the requested output.
pub fn fit_rows(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    weights: RowWeights<'_>,
    output: RowOutput,
    config: &FitConfig,
) -> Result<RowwiseOutput> {
    config.validate()?;
    check_rowwise_shapes(y, x, weights)?;

    let n = y.nrows();
    let eval = |i: usize| fit_row(i, y, x, weights, output, config).map_err(|e| e.in_row(i));

    // Collect every outcome first so the reported error is the lowest failing
    // row in both modes.
    let outcomes: Vec<Result<RowFit>> = if config.parallel {
        (0..n).into_par_iter().map(eval).collect()
    } else {
        (0..n).map(eval).collect()
    };
    let fits = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

    let mut values = DMatrix::from_element(n, y.ncols(), NA);
    let mut skipped_rows = Vec::new();
    for (i, fit) in fits.into_iter().enumerate() {
        match fit {
            RowFit::Fitted {
                columns,
                values: row,
            } => {
                for (&j, v) in columns.iter().zip(row) {
                    values[(i, j)] = v;
                }
            }
            RowFit::Skipped => skipped_rows.push(i),
        }
    }

    if !skipped_rows.is_empty() {
        debug!(
            "{} of {} rows skipped: no more valid observations than the {} regressors",
            skipped_rows.len(),
            n,
            x.ncols()
        );
    }

    Ok(RowwiseOutput {
        values,
        skipped_rows,
    })
}

/// Fit one response row on its valid subset.
pub fn fit_row(
    i: usize,
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    weights: RowWeights<'_>,
    output: RowOutput,
    config: &FitConfig,
) -> Result<RowFit> {
    let ids = valid_column_indices(y.row(i).iter());
    let k = x.ncols();
    if ids.len() <= k {
        trace!("row {i}: {} valid observations, {k} regressors; skipped", ids.len());
        return Ok(RowFit::Skipped);
    }

    let y_sub = DMatrix::from_iterator(1, ids.len(), ids.iter().map(|&j| y[(i, j)]));
    let x_sub = x.select_rows(ids.iter());
    let w_sub = match weights {
        RowWeights::Unweighted => None,
        RowWeights::PerCell(w) => Some(DVector::from_iterator(
            ids.len(),
            ids.iter().map(|&j| w[(i, j)]),
        )),
    };

    let block = fit_block(&y_sub, &x_sub, w_sub.as_ref(), config)?;
    let picked = match output {
        RowOutput::Residuals => block.residuals,
        RowOutput::Fitted => block.fitted,
    };

    Ok(RowFit::Fitted {
        columns: ids,
        values: picked.iter().copied().collect(),
    })
}

pub fn fit_residuals_rowwise(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_rows(y, x, RowWeights::Unweighted, RowOutput::Residuals, config)?.values)
}

pub fn fit_predicted_rowwise(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_rows(y, x, RowWeights::Unweighted, RowOutput::Fitted, config)?.values)
}

pub fn fit_residuals_rowwise_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_rows(y, x, RowWeights::PerCell(w), RowOutput::Residuals, config)?.values)
}

pub fn fit_predicted_rowwise_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
    config: &FitConfig,
) -> Result<DMatrix<f64>> {
    Ok(fit_rows(y, x, RowWeights::PerCell(w), RowOutput::Fitted, config)?.values)
}

fn check_rowwise_shapes(y: &DMatrix<f64>, x: &DMatrix<f64>, weights: RowWeights<'_>) -> Result<()> {
    if x.nrows() != y.ncols() {
        return Err(FitError::DimensionMismatch {
            what: "design rows vs response columns",
            expected: y.ncols(),
            got: x.nrows(),
        });
    }
    if let RowWeights::PerCell(w) = weights {
        if w.nrows() != y.nrows() {
            return Err(FitError::DimensionMismatch {
                what: "weight rows vs response rows",
                expected: y.nrows(),
                got: w.nrows(),
            });
        }
        if w.ncols() != y.ncols() {
            return Err(FitError::DimensionMismatch {
                what: "weight columns vs response columns",
                expected: y.ncols(),
                got: w.ncols(),
            });
        }
    }
    Ok(())
}
