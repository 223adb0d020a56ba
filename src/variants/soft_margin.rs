//! Soft-margin SVM with a single box constraint `C`

use crate::core::{Result, TrainingConfig};
use crate::kernel::KernelFunction;
use crate::solver::SoftMarginBounds;
use crate::variants::{check_cost, split_params, Variant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftMarginParams {
    pub c: f64,
}

impl SoftMarginParams {
    pub fn new(c: f64) -> Result<Self> {
        let params = Self { c };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        check_cost("C", self.c)
    }

    /// Parse the flat layout `[C]` or `[C, width]`
    pub fn from_slice(params: &[f64]) -> Result<(Self, KernelFunction)> {
        let (own, kernel) = split_params(SoftMargin::NAME, params, 1)?;
        Ok((Self::new(own[0])?, kernel))
    }
}

/// Uniform soft margin: `0 <= α_i <= C` for every sample
#[derive(Debug, Clone)]
pub struct SoftMargin {
    params: SoftMarginParams,
    kernel: KernelFunction,
    config: TrainingConfig,
}

impl SoftMargin {
    pub fn new(params: SoftMarginParams, kernel: KernelFunction) -> Self {
        Self {
            params,
            kernel,
            config: TrainingConfig::default(),
        }
    }

    /// Build from a flat parameter vector (see [`SoftMarginParams::from_slice`])
    pub fn from_params(params: &[f64]) -> Result<Self> {
        let (params, kernel) = SoftMarginParams::from_slice(params)?;
        Ok(Self::new(params, kernel))
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn params(&self) -> &SoftMarginParams {
        &self.params
    }
}

impl Variant for SoftMargin {
    type Bounds = SoftMarginBounds;
    const NAME: &'static str = "soft-margin";

    fn bounds(&self) -> SoftMarginBounds {
        SoftMarginBounds { c: self.params.c }
    }

    fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SVMError, SVMModel};
    use crate::data::Dataset;
    use ndarray::array;

    #[test]
    fn test_from_params() {
        let svm = SoftMargin::from_params(&[2.0]).expect("linear");
        assert_eq!(svm.params().c, 2.0);
        assert_eq!(svm.kernel(), &KernelFunction::Linear);

        let svm = SoftMargin::from_params(&[2.0, 0.5]).expect("rbf");
        assert_eq!(svm.kernel().params(), vec![0.5]);

        assert!(matches!(
            SoftMargin::from_params(&[]),
            Err(SVMError::ParameterCount { actual: 0, .. })
        ));
        assert!(matches!(
            SoftMargin::from_params(&[1.0, 0.5, 3.0]),
            Err(SVMError::ParameterCount { actual: 3, .. })
        ));
        assert!(matches!(
            SoftMargin::from_params(&[1.0, 0.0]),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(SoftMarginParams::new(-1.0).is_err());
    }

    #[test]
    fn test_separable_points_use_inner_support_vectors() {
        let dataset = Dataset::new(
            array![[2.0, 2.0], [3.0, 3.0], [-2.0, -2.0], [-3.0, -3.0]],
            vec![1.0, 1.0, -1.0, -1.0],
        )
        .expect("valid dataset");
        let config = TrainingConfig::default()
            .with_max_iterations(1000)
            .with_seed(3);
        let svm = SoftMargin::new(SoftMarginParams { c: 100.0 }, KernelFunction::Linear)
            .with_config(config);

        let trained = svm.train(&dataset).expect("training succeeds");
        assert!(trained.report.converged);

        for (x, &y) in dataset.features().outer_iter().zip(dataset.labels()) {
            assert_eq!(trained.model.predict(x).label, y);
        }

        // Only the two points nearest the boundary carry weight
        let significant: Vec<Vec<f64>> = trained
            .model
            .support_vectors()
            .outer_iter()
            .zip(trained.model.weights())
            .filter(|(_, w)| w.abs() > 1e-3)
            .map(|(sv, _)| sv.to_vec())
            .collect();
        assert_eq!(significant, vec![vec![2.0, 2.0], vec![-2.0, -2.0]]);
        assert_eq!(trained.solver_bias, trained.bias());
    }

    #[test]
    fn test_rejects_single_class() {
        let dataset =
            Dataset::new(array![[1.0], [2.0]], vec![1.0, 1.0]).expect("valid dataset");
        let svm = SoftMargin::new(SoftMarginParams { c: 1.0 }, KernelFunction::Linear);
        assert!(matches!(
            svm.train(&dataset),
            Err(SVMError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_features() {
        let dataset =
            Dataset::new(array![[1.0], [f64::NAN]], vec![1.0, -1.0]).expect("valid dataset");
        let svm = SoftMargin::new(SoftMarginParams { c: 1.0 }, KernelFunction::Linear);
        assert!(matches!(
            svm.train(&dataset),
            Err(SVMError::InvalidDataset(_))
        ));
    }
}
