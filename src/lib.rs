//! SMO-trained binary Support Vector Machines
//!
//! Three variants share one Sequential Minimal Optimization solver and differ
//! only in the upper bound each multiplier is confined to:
//! - soft margin: one box constraint `C` for every sample
//! - cost-sensitive: one box constraint per class
//! - margin-calibrated: cost-sensitive bounds scaled by per-class margin
//!   factors, followed by a bias recalibration on the margin support vectors

pub mod api;
pub mod core;
pub mod data;
pub mod kernel;
pub mod model;
pub mod persistence;
pub mod solver;
pub mod utils;
pub mod variants;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, ModelInfo, TrainedClassifier, VariantParams, SVM};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::{Dataset, Delimiter};
pub use crate::kernel::{GramMatrix, Kernel, KernelFunction, LinearKernel, RBFKernel};
pub use crate::model::SupportVectorModel;
pub use crate::solver::{BoundPolicy, SMOSolver};
pub use crate::variants::{
    CostSensitive, CostSensitiveParams, MarginCalibrated, MarginCalibratedParams, SoftMargin,
    SoftMarginParams, TrainedSVM, Variant,
};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
