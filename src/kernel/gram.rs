//! Precomputed Gram matrix over a training set

use crate::kernel::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Full `m×m` matrix of pairwise kernel values, `K[i][j] = k(x_i, x_j)`.
///
/// Built once before optimization and never mutated afterwards, so a single
/// instance can back several solvers that differ only in their bounds.
#[derive(Debug, Clone)]
pub struct GramMatrix {
    values: Array2<f64>,
}

impl GramMatrix {
    /// Evaluate the kernel over every pair of rows of `x`
    pub fn compute<K: Kernel + ?Sized>(kernel: &K, x: ArrayView2<f64>) -> Self {
        let m = x.nrows();
        let mut values = Array2::zeros((m, m));
        for (j, row) in x.outer_iter().enumerate() {
            values.column_mut(j).assign(&kernel.compute_rows(x, row));
        }
        Self { values }
    }

    /// Number of samples covered
    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    /// Kernel value between samples `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Kernel values between sample `i` and every sample
    #[inline]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// The underlying matrix
    pub fn as_array(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}
