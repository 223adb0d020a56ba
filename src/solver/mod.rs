//! SVM solver implementations
//!
//! The Sequential Minimal Optimization (SMO) algorithm over a precomputed Gram
//! matrix, parameterized by the per-sample multiplier bounds.

pub mod bounds;
pub mod smo;

pub use self::bounds::*;
pub use self::smo::*;
