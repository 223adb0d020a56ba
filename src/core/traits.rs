//! Core traits for SVM inference

use crate::core::Prediction;
use ndarray::{ArrayView1, ArrayView2};

/// Trained binary SVM model
pub trait SVMModel: Send + Sync {
    /// Raw decision value `Σ K(sv, x) * w_sv + b`
    fn decision_function(&self, x: ArrayView1<f64>) -> f64;

    /// Predict a single sample
    fn predict(&self, x: ArrayView1<f64>) -> Prediction {
        Prediction::from_decision(self.decision_function(x))
    }

    /// Predict every row of a feature matrix
    fn predict_batch(&self, x: ArrayView2<f64>) -> Vec<Prediction> {
        x.outer_iter().map(|row| self.predict(row)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
