//! Runtime-selectable kernel, used where the kernel is chosen from
//! configuration (CLI, flat parameter vectors, saved models)

use crate::core::Result;
use crate::kernel::{Kernel, LinearKernel, RBFKernel};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelFunction {
    Linear,
    Rbf(RBFKernel),
}

impl KernelFunction {
    /// Linear kernel
    pub fn linear() -> Self {
        Self::Linear
    }

    /// RBF kernel with the given width
    pub fn rbf(width: f64) -> Result<Self> {
        Ok(Self::Rbf(RBFKernel::new(width)?))
    }

    /// Build a kernel from the trailing entries of a flat parameter vector.
    ///
    /// No entry selects the linear kernel, one entry is the RBF width.
    pub fn from_params(params: &[f64]) -> Option<Result<Self>> {
        match params {
            [] => Some(Ok(Self::Linear)),
            [width] => Some(Self::rbf(*width)),
            _ => None,
        }
    }

    /// Kernel parameters in flat form (empty for linear)
    pub fn params(&self) -> Vec<f64> {
        match self {
            Self::Linear => Vec::new(),
            Self::Rbf(rbf) => vec![rbf.width()],
        }
    }

    /// Re-check parameters, e.g. after loading a model
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Linear => Ok(()),
            Self::Rbf(rbf) => rbf.validate(),
        }
    }
}

impl Default for KernelFunction {
    fn default() -> Self {
        Self::Linear
    }
}

impl fmt::Display for KernelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Rbf(rbf) => write!(f, "rbf(width={})", rbf.width()),
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        match self {
            Self::Linear => LinearKernel.compute(x, y),
            Self::Rbf(rbf) => rbf.compute(x, y),
        }
    }

    fn compute_rows(&self, rows: ArrayView2<f64>, a: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Self::Linear => LinearKernel.compute_rows(rows, a),
            Self::Rbf(rbf) => rbf.compute_rows(rows, a),
        }
    }
}
