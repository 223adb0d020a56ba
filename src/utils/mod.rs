//! Utility functions for SVM operations

use crate::core::{Result, SVMError};
use crate::data::Dataset;

/// Feature scaling utilities
///
/// Scaling is fitted on the training set and the same parameters are applied
/// to every set the model later sees.
pub mod scaling {
    use super::*;
    use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
    use serde::{Deserialize, Serialize};

    /// Feature scaling methods
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "method", rename_all = "snake_case")]
    pub enum ScalingMethod {
        /// Min-Max scaling to [min_val, max_val] range
        MinMax { min_val: f64, max_val: f64 },
        /// Standard (Z-score) normalization: (x - mean) / std
        StandardScore,
        /// Unit scaling: x / max(|x|)
        UnitScale,
    }

    impl Default for ScalingMethod {
        fn default() -> Self {
            Self::MinMax {
                min_val: -1.0,
                max_val: 1.0,
            }
        }
    }

    /// Per-feature statistics fitted on training data
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ScalingParams {
        pub method: ScalingMethod,
        pub feature_stats: Vec<FeatureStats>,
    }

    /// Statistics for a single feature
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct FeatureStats {
        pub min: f64,
        pub max: f64,
        pub mean: f64,
        pub std: f64,
    }

    impl FeatureStats {
        fn from_column(values: ArrayView1<f64>) -> Self {
            let min = values.fold(f64::INFINITY, |a, &b| a.min(b));
            let max = values.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let n = values.len();
            let mean = values.sum() / n as f64;
            // Sample standard deviation
            let variance = if n > 1 {
                values.fold(0.0, |acc, &x| acc + (x - mean).powi(2)) / (n - 1) as f64
            } else {
                0.0
            };
            Self {
                min,
                max,
                mean,
                std: variance.sqrt(),
            }
        }
    }

    impl ScalingParams {
        /// Compute scaling parameters from training data
        pub fn fit(features: ArrayView2<f64>, method: ScalingMethod) -> Self {
            let feature_stats = features
                .axis_iter(Axis(1))
                .map(FeatureStats::from_column)
                .collect();
            Self {
                method,
                feature_stats,
            }
        }

        /// Number of features the parameters were fitted on
        pub fn dim(&self) -> usize {
            self.feature_stats.len()
        }

        /// Scale every row of a feature matrix
        pub fn transform(&self, features: ArrayView2<f64>) -> Result<Array2<f64>> {
            if features.ncols() != self.dim() {
                return Err(SVMError::DimensionMismatch {
                    expected: self.dim(),
                    actual: features.ncols(),
                });
            }
            let mut scaled = features.to_owned();
            for (mut column, stats) in scaled.axis_iter_mut(Axis(1)).zip(&self.feature_stats) {
                column.mapv_inplace(|v| self.scale_value(v, stats));
            }
            Ok(scaled)
        }

        /// Scale a dataset, keeping its labels
        pub fn transform_dataset(&self, dataset: &Dataset) -> Result<Dataset> {
            let features = self.transform(dataset.features())?;
            Dataset::new(features, dataset.labels().to_vec())
        }

        /// Scale a single value using the appropriate method
        fn scale_value(&self, value: f64, stats: &FeatureStats) -> f64 {
            match self.method {
                ScalingMethod::MinMax { min_val, max_val } => {
                    if (stats.max - stats.min).abs() < 1e-12 {
                        // Constant feature
                        (min_val + max_val) / 2.0
                    } else {
                        let normalized = (value - stats.min) / (stats.max - stats.min);
                        min_val + normalized * (max_val - min_val)
                    }
                }
                ScalingMethod::StandardScore => {
                    if stats.std < 1e-12 {
                        0.0
                    } else {
                        (value - stats.mean) / stats.std
                    }
                }
                ScalingMethod::UnitScale => {
                    let max_abs = stats.max.abs().max(stats.min.abs());
                    if max_abs < 1e-12 {
                        0.0
                    } else {
                        value / max_abs
                    }
                }
            }
        }
    }

    /// Convenience function: fit and transform in one step
    pub fn fit_transform(
        dataset: &Dataset,
        method: ScalingMethod,
    ) -> Result<(Dataset, ScalingParams)> {
        let params = ScalingParams::fit(dataset.features(), method);
        let transformed = params.transform_dataset(dataset)?;
        Ok((transformed, params))
    }
}

/// Validation and preprocessing utilities
pub mod validation {
    use super::*;

    /// Check if dataset labels are balanced (roughly equal +1 and -1 samples)
    ///
    /// Returns the positive count, the negative count and their ratio.
    pub fn check_label_balance(dataset: &Dataset) -> (usize, usize, f64) {
        let (positive_count, negative_count) = dataset.class_counts();
        let balance_ratio = if negative_count == 0 {
            f64::INFINITY
        } else {
            positive_count as f64 / negative_count as f64
        };
        (positive_count, negative_count, balance_ratio)
    }

    /// Reject datasets the solver cannot train on
    pub fn validate_training_set(dataset: &Dataset) -> Result<()> {
        if dataset.len() < 2 {
            return Err(SVMError::InvalidDataset(format!(
                "at least 2 samples are required, got {}",
                dataset.len()
            )));
        }
        let (positives, negatives) = dataset.class_counts();
        if positives == 0 || negatives == 0 {
            return Err(SVMError::InvalidDataset(format!(
                "both classes must be present ({positives} positive, {negatives} negative)"
            )));
        }
        if !dataset.is_finite() {
            return Err(SVMError::InvalidDataset(
                "feature matrix contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }
}
