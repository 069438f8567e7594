//! Public entry points.
//!
//! [`Fitter`] carries a [`FitConfig`] and exposes every kernel and driver as a
//! method. The free functions run the same operations with the default
//! configuration (normal equations, rows fitted in parallel).

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitConfig, FitSummary};
use crate::error::Result;
use crate::fit::{self, RowOutput, RowWeights, RowwiseOutput};

#[derive(Debug, Clone, Default)]
pub struct Fitter {
    config: FitConfig,
}

impl Fitter {
    pub fn new(config: FitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration from `ROWFIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(FitConfig::from_env()?)
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn residuals(&self, y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        fit::fit_residuals(y, x, &self.config)
    }

    pub fn predicted(&self, y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        fit::fit_predicted(y, x, &self.config)
    }

    pub fn residuals_weighted(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DVector<f64>,
    ) -> Result<DMatrix<f64>> {
        fit::fit_residuals_weighted(y, x, w, &self.config)
    }

    pub fn predicted_weighted(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DVector<f64>,
    ) -> Result<DMatrix<f64>> {
        fit::fit_predicted_weighted(y, x, w, &self.config)
    }

    pub fn summary(&self, y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<FitSummary> {
        fit::fit(y, x, &self.config)
    }

    pub fn summary_weighted(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DVector<f64>,
    ) -> Result<FitSummary> {
        fit::fit_weighted(y, x, w, &self.config)
    }

    pub fn residuals_rowwise(&self, y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        fit::fit_residuals_rowwise(y, x, &self.config)
    }

    pub fn predicted_rowwise(&self, y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        fit::fit_predicted_rowwise(y, x, &self.config)
    }

    pub fn residuals_rowwise_weighted(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>> {
        fit::fit_residuals_rowwise_weighted(y, x, w, &self.config)
    }

    pub fn predicted_rowwise_weighted(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>> {
        fit::fit_predicted_rowwise_weighted(y, x, w, &self.config)
    }

    /// Row-wise fit that also reports which rows were skipped.
    pub fn rows(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        weights: RowWeights<'_>,
        output: RowOutput,
    ) -> Result<RowwiseOutput> {
        fit::fit_rows(y, x, weights, output, &self.config)
    }

    pub fn residuals_batch_unchecked(
        &self,
        y: &DMatrix<f64>,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>> {
        fit::fit_residuals_batch_unchecked(y, x, w, &self.config)
    }
}

/// OLS residuals `Y - Y·X·(XᵀX)⁻¹·Xᵀ` for complete data.
pub fn fit_residuals(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    Fitter::default().residuals(y, x)
}

/// OLS fitted values for complete data.
pub fn fit_predicted(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    Fitter::default().predicted(y, x)
}

/// WLS residuals scaled by `sqrt(w)`.
pub fn fit_residuals_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DVector<f64>,
) -> Result<DMatrix<f64>> {
    Fitter::default().residuals_weighted(y, x, w)
}

/// OLS coefficients and residual degrees of freedom.
pub fn fit(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<FitSummary> {
    Fitter::default().summary(y, x)
}

/// Per-row OLS residuals on each row's non-missing columns; NaN elsewhere.
pub fn fit_residuals_rowwise(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    Fitter::default().residuals_rowwise(y, x)
}

/// Per-row OLS fitted values on each row's non-missing columns; NaN elsewhere.
pub fn fit_predicted_rowwise(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    Fitter::default().predicted_rowwise(y, x)
}

/// Per-row WLS residuals with per-cell weights; NaN where nothing was fitted.
pub fn fit_residuals_rowwise_weighted(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    Fitter::default().residuals_rowwise_weighted(y, x, w)
}

/// Per-row WLS residuals over full rows of data known to be complete.
pub fn fit_residuals_batch_unchecked(
    y: &DMatrix<f64>,
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    Fitter::default().residuals_batch_unchecked(y, x, w)
}
