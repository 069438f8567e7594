//! Mathematical utilities: missing-value detection and least-squares solvers.

pub mod missing;
pub mod solve;

pub use missing::*;
pub use solve::*;
