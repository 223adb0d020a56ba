//! Core type definitions for SVM training and inference

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Label of the positive class
pub const POSITIVE: f64 = 1.0;
/// Label of the negative class
pub const NEGATIVE: f64 = -1.0;

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Build a prediction from a raw decision value.
    ///
    /// Only strictly positive scores map to the positive class.
    pub fn from_decision(decision_value: f64) -> Self {
        let label = if decision_value > 0.0 {
            POSITIVE
        } else {
            NEGATIVE
        };
        Self {
            label,
            decision_value,
        }
    }

    /// Whether the predicted label is +1
    pub fn is_positive(&self) -> bool {
        self.label > 0.0
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Configuration shared by all SMO-trained variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of outer passes (full or non-bound sweeps)
    pub max_iterations: usize,
    /// Tolerance for the approximate KKT check
    pub tolerance: f64,
    /// Multiplier changes smaller than this are discarded
    pub min_step: f64,
    /// Seed for the fallback pair selection; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
            min_step: 1e-5,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Set the maximum number of outer passes
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the KKT tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the minimum accepted multiplier change
    pub fn with_min_step(mut self, min_step: f64) -> Self {
        self.min_step = min_step;
        self
    }

    /// Fix the random seed so runs are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the solver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "tolerance must be positive and finite, got: {}",
                self.tolerance
            )));
        }
        if !(self.min_step.is_finite() && self.min_step >= 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "min_step must be non-negative and finite, got: {}",
                self.min_step
            )));
        }
        Ok(())
    }
}

/// Result of the optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers, one per training sample
    pub alpha: Vec<f64>,
    /// Upper bound `C_i` of every multiplier
    pub upper_bounds: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Number of outer passes performed
    pub iterations: usize,
    /// Whether the last full sweep made no update
    pub converged: bool,
    /// Total number of successful pair updates
    pub updates: usize,
    /// Final dual objective value
    pub objective_value: f64,
}

impl OptimizationResult {
    /// Whether sample `i` is a support vector (`α_i > 0`)
    pub fn is_support_vector(&self, i: usize) -> bool {
        self.alpha[i] > 0.0
    }

    /// Whether sample `i` is a margin support vector (`0 < α_i < C_i`)
    pub fn is_margin_support_vector(&self, i: usize) -> bool {
        self.alpha[i] > 0.0 && self.alpha[i] < self.upper_bounds[i]
    }

    /// Summarize the run for callers
    pub fn report(&self) -> TrainingReport {
        let n = self.alpha.len();
        TrainingReport {
            iterations: self.iterations,
            converged: self.converged,
            updates: self.updates,
            n_support_vectors: (0..n).filter(|&i| self.is_support_vector(i)).count(),
            n_margin_support_vectors: (0..n)
                .filter(|&i| self.is_margin_support_vector(i))
                .count(),
            objective: self.objective_value,
        }
    }
}

/// Outcome of a training run.
///
/// Hitting `max_iterations` is not an error; callers check `converged`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Number of outer passes performed
    pub iterations: usize,
    /// Whether a full sweep finished without any update
    pub converged: bool,
    /// Total number of successful pair updates
    pub updates: usize,
    /// Samples with a positive multiplier
    pub n_support_vectors: usize,
    /// Support vectors strictly inside their bound
    pub n_margin_support_vectors: usize,
    /// Dual objective at the final multipliers
    pub objective: f64,
}
