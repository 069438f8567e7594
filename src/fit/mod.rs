//! Least-squares fitting.
//!
//! Responsibilities:
//!
//! - OLS / WLS kernels on complete blocks (`kernel`)
//! - per-row valid-subset fitting with NaN for skipped cells (`rowwise`)
//! - full-row weighted fitting for data known to be complete (`batch`)

pub mod batch;
pub mod kernel;
pub mod rowwise;

pub use batch::*;
pub use kernel::*;
pub use rowwise::*;
