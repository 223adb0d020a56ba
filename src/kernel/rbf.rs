//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-||x - y||² / σ²)
//! where σ (the kernel width) is the only hyperparameter.

use crate::core::{Result, SVMError};
use crate::kernel::Kernel;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// RBF kernel parameterized by its width: K(x, y) = exp(-||x - y||² / σ²)
///
/// The width controls the "reach" of each training example:
/// - Small width: close points have high influence (potential overfitting)
/// - Large width: distant points have influence (potential underfitting)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RBFKernel {
    width: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with the given width
    ///
    /// # Errors
    /// Returns `InvalidParameter` if the width is zero or not finite.
    pub fn new(width: f64) -> Result<Self> {
        let kernel = Self { width };
        kernel.validate()?;
        Ok(kernel)
    }

    /// Get the width parameter
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Check the width, e.g. after deserialization
    pub fn validate(&self) -> Result<()> {
        if self.width == 0.0 || !self.width.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "RBF width must be non-zero and finite, got: {}",
                self.width
            )));
        }
        Ok(())
    }

    #[inline]
    fn from_squared_distance(&self, squared_distance: f64) -> f64 {
        (-squared_distance / (self.width * self.width)).exp()
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        self.from_squared_distance(squared_euclidean_distance(x, y))
    }

    fn compute_rows(&self, rows: ArrayView2<f64>, a: ArrayView1<f64>) -> Array1<f64> {
        rows.outer_iter()
            .map(|row| self.from_squared_distance(squared_euclidean_distance(row, a)))
            .collect()
    }
}

/// Compute squared Euclidean distance ||x - y||² = Σᵢ (xᵢ - yᵢ)²
///
/// Accumulates the difference dot product directly without building the
/// difference vector.
#[inline]
pub(crate) fn squared_euclidean_distance(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    x.iter().zip(y.iter()).fold(0.0, |acc, (&xi, &yi)| {
        let diff = xi - yi;
        acc + diff * diff
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_rbf_kernel_creation() {
        let kernel = RBFKernel::new(0.5).expect("valid width");
        assert_eq!(kernel.width(), 0.5);
    }

    #[test]
    fn test_rbf_kernel_zero_width() {
        let result = RBFKernel::new(0.0);
        assert!(matches!(result, Err(SVMError::InvalidParameter(_))));
    }

    #[test]
    fn test_rbf_kernel_non_finite_width() {
        assert!(RBFKernel::new(f64::NAN).is_err());
        assert!(RBFKernel::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rbf_kernel_identical_vectors() {
        let kernel = RBFKernel::new(1.0).expect("valid width");
        let x = array![1.0, 2.0, 3.0];
        assert_relative_eq!(kernel.compute(x.view(), x.view()), 1.0);
    }

    #[test]
    fn test_rbf_kernel_known_value() {
        // ||x - y||² = 1 + 4 = 5, width² = 4 -> exp(-5/4)
        let kernel = RBFKernel::new(2.0).expect("valid width");
        let x = array![1.0, 0.0];
        let y = array![0.0, 2.0];
        assert_relative_eq!(
            kernel.compute(x.view(), y.view()),
            (-1.25f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rbf_kernel_width_sign_is_irrelevant() {
        let positive = RBFKernel::new(0.7).expect("valid width");
        let negative = RBFKernel::new(-0.7).expect("valid width");
        let x = array![0.3, -1.0];
        let y = array![1.0, 0.4];
        assert_eq!(
            positive.compute(x.view(), y.view()),
            negative.compute(x.view(), y.view())
        );
    }

    #[test]
    fn test_rbf_kernel_different_widths() {
        let x = array![0.0, 0.0];
        let y = array![1.0, 1.0];

        let narrow = RBFKernel::new(0.5).expect("valid width");
        let wide = RBFKernel::new(2.0).expect("valid width");

        // A wider kernel keeps distant points more similar
        assert!(wide.compute(x.view(), y.view()) > narrow.compute(x.view(), y.view()));
    }

    #[test]
    fn test_rbf_kernel_symmetry() {
        let kernel = RBFKernel::new(0.8).expect("valid width");
        let x = array![1.0, -2.0, 0.5];
        let y = array![0.0, 1.0, 3.0];
        assert_eq!(
            kernel.compute(x.view(), y.view()),
            kernel.compute(y.view(), x.view())
        );
    }

    #[test]
    fn test_rbf_kernel_rows() {
        let kernel = RBFKernel::new(1.0).expect("valid width");
        let rows = array![[0.0, 0.0], [1.0, 0.0], [3.0, 4.0]];
        let a = array![0.0, 0.0];

        let values = kernel.compute_rows(rows.view(), a.view());
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[1], (-1.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(values[2], (-25.0f64).exp(), epsilon = 1e-20);
    }

    #[test]
    fn test_squared_euclidean_distance() {
        let x = array![1.0, 2.0, 3.0];
        let y = array![2.0, 0.0, 3.0];
        assert_eq!(squared_euclidean_distance(x.view(), y.view()), 5.0);
        assert_eq!(squared_euclidean_distance(x.view(), x.view()), 0.0);
    }

    #[test]
    fn test_rbf_kernel_numerical_stability() {
        let kernel = RBFKernel::new(0.01).expect("valid width");
        let x = array![1e3, -1e3];
        let y = array![-1e3, 1e3];
        let value = kernel.compute(x.view(), y.view());
        assert!(value.is_finite());
        assert!(value >= 0.0);
    }
}
