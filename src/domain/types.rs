//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so a fit
//! configuration can be stored next to the results it produced.

use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Environment variable selecting the solve strategy (`inverse` / `svd`).
pub const ENV_STRATEGY: &str = "ROWFIT_STRATEGY";
/// Environment variable toggling row parallelism (`true` / `false`, `1` / `0`).
pub const ENV_PARALLEL: &str = "ROWFIT_PARALLEL";
/// Environment variable overriding the SVD singular-value tolerance.
pub const ENV_SVD_TOLERANCE: &str = "ROWFIT_SVD_TOLERANCE";

/// How the coefficient block is solved for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStrategy {
    /// Normal equations: `Y·W·X·(Xᵀ·W·X)⁻¹`.
    ///
    /// Fast for a handful of regressors, but fails on a singular cross-product
    /// and loses precision when it is ill-conditioned.
    #[default]
    Inverse,
    /// SVD of the `sqrt(w)`-scaled design.
    ///
    /// Singular values below `svd_tolerance` are treated as zero, so collinear
    /// designs produce the minimum-norm solution instead of an error.
    Svd,
}

impl SolveStrategy {
    pub const ALL: [SolveStrategy; 2] = [SolveStrategy::Inverse, SolveStrategy::Svd];

    pub fn display_name(self) -> &'static str {
        match self {
            SolveStrategy::Inverse => "inverse",
            SolveStrategy::Svd => "svd",
        }
    }
}

impl FromStr for SolveStrategy {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inverse" | "normal" => Ok(SolveStrategy::Inverse),
            "svd" => Ok(SolveStrategy::Svd),
            other => Err(FitError::InvalidConfig(format!(
                "unknown solve strategy '{other}' (expected 'inverse' or 'svd')"
            ))),
        }
    }
}

/// Configuration shared by every kernel and driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub strategy: SolveStrategy,
    /// Fit response rows on the rayon pool. Results, and the row reported on
    /// failure (the lowest failing one), do not depend on this flag.
    pub parallel: bool,
    /// Absolute threshold: singular values at or below it are treated as zero
    /// (`Svd` only). It is not scaled by the largest singular value.
    pub svd_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            strategy: SolveStrategy::Inverse,
            parallel: true,
            svd_tolerance: 1e-10,
        }
    }
}

impl FitConfig {
    pub fn with_strategy(mut self, strategy: SolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_svd_tolerance(mut self, tolerance: f64) -> Self {
        self.svd_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.svd_tolerance.is_finite() && self.svd_tolerance >= 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "svd_tolerance must be finite and >= 0, got {}",
                self.svd_tolerance
            )));
        }
        Ok(())
    }

    /// Build a configuration from the process environment (and `.env`, if any).
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FitConfig::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_STRATEGY) {
            config.strategy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_PARALLEL) {
            config.parallel = parse_flag(ENV_PARALLEL, &value)?;
        }
        if let Some(value) = lookup(ENV_SVD_TOLERANCE) {
            config.svd_tolerance = value.trim().parse().map_err(|_| {
                FitError::InvalidConfig(format!("{ENV_SVD_TOLERANCE}={value} is not a number"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FitError::InvalidConfig(format!(
            "{key}={value} is not a boolean flag"
        ))),
    }
}

/// Coefficients and residual degrees of freedom of a whole-block fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// One row of regression coefficients per response row (n × k).
    pub coefficients: DMatrix<f64>,
    /// `m - k`: observations minus regressors.
    pub df_residual: usize,
    /// Per response row, `RSS / df_residual` (NaN when `df_residual == 0`).
    ///
    /// Weighted fits use the `sqrt(w)`-scaled residuals, so this is the
    /// weighted residual variance.
    pub residual_variance: DVector<f64>,
}
