//! Trained model artifacts
//!
//! After optimization only the support vectors, their label-weighted
//! multipliers, the bias and the kernel are kept. The training set, the Gram
//! matrix and the error cache are dropped.

use crate::core::{OptimizationResult, Result, SVMError, SVMModel};
use crate::kernel::{Kernel, KernelFunction};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Immutable binary classifier `f(x) = Σ_sv K(sv, x) * w_sv + b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorModel {
    kernel: KernelFunction,
    support_vectors: Array2<f64>,
    weights: Array1<f64>,
    bias: f64,
}

impl SupportVectorModel {
    /// Assemble a model from its parts
    ///
    /// # Errors
    /// `DimensionMismatch` if there is not exactly one weight per support vector,
    /// or an invalid kernel parameter.
    pub fn new(
        kernel: KernelFunction,
        support_vectors: Array2<f64>,
        weights: Array1<f64>,
        bias: f64,
    ) -> Result<Self> {
        kernel.validate()?;
        if support_vectors.nrows() != weights.len() {
            return Err(SVMError::DimensionMismatch {
                expected: support_vectors.nrows(),
                actual: weights.len(),
            });
        }
        if !bias.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "bias must be finite, got: {bias}"
            )));
        }
        Ok(Self {
            kernel,
            support_vectors,
            weights,
            bias,
        })
    }

    /// Extract the support vectors (`α_i > 0`) of a finished optimization
    pub fn from_solution(
        kernel: KernelFunction,
        features: ArrayView2<f64>,
        labels: &[f64],
        result: &OptimizationResult,
    ) -> Self {
        let indices: Vec<usize> = (0..labels.len())
            .filter(|&i| result.is_support_vector(i))
            .collect();
        let support_vectors = features.select(Axis(0), &indices);
        let weights = indices
            .iter()
            .map(|&i| labels[i] * result.alpha[i])
            .collect();

        Self {
            kernel,
            support_vectors,
            weights,
            bias: result.b,
        }
    }

    /// Same support vectors with a different bias
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// `Σ_sv K(sv, x) * w_sv`
    pub fn decision_function_without_bias(&self, x: ArrayView1<f64>) -> f64 {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.kernel
            .compute_rows(self.support_vectors.view(), x)
            .dot(&self.weights)
    }

    /// Support vectors, one per row
    pub fn support_vectors(&self) -> ArrayView2<'_, f64> {
        self.support_vectors.view()
    }

    /// Label-weighted multipliers `w_sv = y_i * α_i`
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    /// Number of features the model expects
    pub fn dim(&self) -> usize {
        self.support_vectors.ncols()
    }
}

impl SVMModel for SupportVectorModel {
    fn decision_function(&self, x: ArrayView1<f64>) -> f64 {
        self.decision_function_without_bias(x) + self.bias
    }

    fn n_support_vectors(&self) -> usize {
        self.weights.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}

/// Primal weight vector `w = Σ_i α_i y_i x_i` over all samples
pub fn weight_vector(features: ArrayView2<f64>, labels: &[f64], alpha: &[f64]) -> Array1<f64> {
    let coefficients: Array1<f64> = alpha.iter().zip(labels).map(|(&a, &y)| a * y).collect();
    features.t().dot(&coefficients)
}

/// Indices of the margin support vectors (`0 < α_i < C_i`)
pub fn margin_support_vectors(result: &OptimizationResult) -> Vec<usize> {
    (0..result.alpha.len())
        .filter(|&i| result.is_margin_support_vector(i))
        .collect()
}
