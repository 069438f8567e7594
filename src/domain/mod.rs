//! Domain types used throughout the fitting code.
//!
//! This module defines:
//!
//! - the solve strategy and run configuration (`SolveStrategy`, `FitConfig`)
//! - whole-block fit outputs (`FitSummary`)

pub mod types;

pub use types::*;
