//! Kernel trait definition

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Implementations are stateless apart from their parameters, so a single kernel
/// can be shared between training runs and trained models.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64;

    /// Compute K(x_i, a) for every row x_i of `rows`
    ///
    /// This is the shape used both to fill Gram matrix columns and to score a
    /// sample against all support vectors at once.
    fn compute_rows(&self, rows: ArrayView2<f64>, a: ArrayView1<f64>) -> Array1<f64> {
        rows.outer_iter().map(|row| self.compute(row, a)).collect()
    }
}
