//! Margin-calibrated ("lopsided") SVM
//!
//! Cost-sensitive bounds are shrunk by per-class margin factors `ap` and `an`,
//! and the bias is recomputed from the margin support vectors so that the
//! boundary sits between the two asymmetric margins.

use crate::core::{OptimizationResult, Result, SVMError, TrainingConfig};
use crate::data::Dataset;
use crate::kernel::KernelFunction;
use crate::model::{margin_support_vectors, SupportVectorModel};
use crate::solver::MarginCalibratedBounds;
use crate::variants::{check_cost, split_params, Variant};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginCalibratedParams {
    pub cp: f64,
    pub cn: f64,
    /// Margin factor of the positive class, in `(0, 1]`
    pub ap: f64,
    /// Margin factor of the negative class, in `(0, 1]`
    pub an: f64,
}

impl MarginCalibratedParams {
    pub fn new(cp: f64, cn: f64, ap: f64, an: f64) -> Result<Self> {
        let params = Self { cp, cn, ap, an };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        check_cost("Cp", self.cp)?;
        check_cost("Cn", self.cn)?;
        check_factor("Ap", self.ap)?;
        check_factor("An", self.an)
    }

    /// Parse the flat layout `[Cp, Cn, Ap, An]` or `[Cp, Cn, Ap, An, width]`
    pub fn from_slice(params: &[f64]) -> Result<(Self, KernelFunction)> {
        let (own, kernel) = split_params(MarginCalibrated::NAME, params, 4)?;
        Ok((Self::new(own[0], own[1], own[2], own[3])?, kernel))
    }
}

fn check_factor(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "{name} must be in (0, 1], got: {value}"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct MarginCalibrated {
    params: MarginCalibratedParams,
    kernel: KernelFunction,
    config: TrainingConfig,
}

impl MarginCalibrated {
    pub fn new(params: MarginCalibratedParams, kernel: KernelFunction) -> Self {
        Self {
            params,
            kernel,
            config: TrainingConfig::default(),
        }
    }

    /// Build from a flat parameter vector (see [`MarginCalibratedParams::from_slice`])
    pub fn from_params(params: &[f64]) -> Result<Self> {
        let (params, kernel) = MarginCalibratedParams::from_slice(params)?;
        Ok(Self::new(params, kernel))
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn params(&self) -> &MarginCalibratedParams {
        &self.params
    }

    /// Bias centered between the positive margin at `1/ap` and the negative
    /// margin at `-an`, averaged over the margin support vectors.
    ///
    /// Returns `None` if either class has no margin support vector.
    pub fn calibrated_bias(
        &self,
        model: &SupportVectorModel,
        dataset: &Dataset,
        result: &OptimizationResult,
    ) -> Option<f64> {
        let MarginCalibratedParams { ap, an, .. } = self.params;
        let mut positive = (0.0, 0usize);
        let mut negative = (0.0, 0usize);

        for i in margin_support_vectors(result) {
            let f = model.decision_function_without_bias(dataset.sample(i));
            if dataset.labels()[i] > 0.0 {
                positive.0 += 1.0 / ap - f;
                positive.1 += 1;
            } else {
                negative.0 += -an + f;
                negative.1 += 1;
            }
        }
        debug!(
            "Margin support vectors: {} positive, {} negative",
            positive.1, negative.1
        );

        if positive.1 == 0 || negative.1 == 0 {
            return None;
        }
        let bp = positive.0 / positive.1 as f64;
        let bn = negative.0 / negative.1 as f64;
        Some((ap * bp + an * bn) / (ap + an))
    }
}

impl Variant for MarginCalibrated {
    type Bounds = MarginCalibratedBounds;
    const NAME: &'static str = "margin-calibrated";

    fn bounds(&self) -> MarginCalibratedBounds {
        let MarginCalibratedParams { cp, cn, ap, an } = self.params;
        MarginCalibratedBounds { cp, cn, ap, an }
    }

    fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn finalize(
        &self,
        model: SupportVectorModel,
        dataset: &Dataset,
        result: &OptimizationResult,
    ) -> SupportVectorModel {
        match self.calibrated_bias(&model, dataset, result) {
            Some(bias) => {
                debug!("Recalibrated bias {:.6} -> {bias:.6}", result.b);
                model.with_bias(bias)
            }
            None => {
                warn!(
                    "A class has no margin support vectors; keeping solver bias {:.6}",
                    result.b
                );
                model
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SVMModel;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn symmetric_line() -> Dataset {
        Dataset::new(array![[2.0], [3.0], [-2.0], [-3.0]], vec![1.0, 1.0, -1.0, -1.0])
            .expect("valid dataset")
    }

    fn config() -> TrainingConfig {
        TrainingConfig::default()
            .with_max_iterations(1000)
            .with_seed(5)
    }

    #[test]
    fn test_params_validation() {
        assert!(MarginCalibratedParams::new(10.0, 10.0, 1.0, 0.5).is_ok());
        assert!(MarginCalibratedParams::new(10.0, 10.0, 0.0, 0.5).is_err());
        assert!(MarginCalibratedParams::new(10.0, 10.0, 1.5, 0.5).is_err());
        assert!(MarginCalibratedParams::new(10.0, -1.0, 1.0, 0.5).is_err());
        assert!(MarginCalibratedParams::new(10.0, 10.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_from_params() {
        let svm = MarginCalibrated::from_params(&[20.0, 10.0, 0.5, 0.25, 2.0]).expect("rbf");
        assert_eq!(
            svm.params(),
            &MarginCalibratedParams {
                cp: 20.0,
                cn: 10.0,
                ap: 0.5,
                an: 0.25
            }
        );
        assert_eq!(svm.kernel().params(), vec![2.0]);

        assert!(matches!(
            MarginCalibrated::from_params(&[20.0, 10.0, 0.5]),
            Err(SVMError::ParameterCount { actual: 3, .. })
        ));
        assert!(matches!(
            MarginCalibrated::from_params(&[20.0, 10.0, 0.5, 0.25, 2.0, 1.0]),
            Err(SVMError::ParameterCount { actual: 6, .. })
        ));
    }

    #[test]
    fn test_asymmetric_factors_shift_bias() {
        // Hard-margin solution: w = 0.5, b = 0, alpha = 0.125 on x = 2 and x = -2.
        // f without bias is +1 and -1 there, so bp = 1/1 - 1 = 0,
        // bn = -0.5 + (-1) = -1.5 and b = (1 * 0 + 0.5 * -1.5) / 1.5 = -0.5.
        let dataset = symmetric_line();
        let svm = MarginCalibrated::new(
            MarginCalibratedParams::new(10.0, 10.0, 1.0, 0.5).expect("valid params"),
            KernelFunction::Linear,
        )
        .with_config(config());

        let trained = svm.train(&dataset).expect("training succeeds");
        assert!(trained.report.converged);
        assert_eq!(trained.report.n_margin_support_vectors, 2);
        assert_abs_diff_eq!(trained.solver_bias, 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(trained.bias(), -0.5, epsilon = 1e-2);
        assert!((trained.bias() - trained.solver_bias).abs() > 0.1);
        assert_abs_diff_eq!(trained.weight_vector[0], 0.5, epsilon = 1e-2);

        for (x, &y) in dataset.features().outer_iter().zip(dataset.labels()) {
            assert_eq!(trained.model.predict(x).label, y);
        }
    }

    #[test]
    fn test_unit_factors_follow_margin_average() {
        // bp = 1 - 1 = 0 and bn = -1 + (-1) = -2, so b = (0 - 2) / 2
        let dataset = symmetric_line();
        let svm = MarginCalibrated::new(
            MarginCalibratedParams::new(10.0, 10.0, 1.0, 1.0).expect("valid params"),
            KernelFunction::Linear,
        )
        .with_config(config());

        let trained = svm.train(&dataset).expect("training succeeds");
        assert_abs_diff_eq!(trained.solver_bias, 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(trained.bias(), -1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_missing_margin_class_keeps_solver_bias() {
        let dataset = symmetric_line();
        let svm = MarginCalibrated::new(
            MarginCalibratedParams::new(10.0, 10.0, 1.0, 0.5).expect("valid params"),
            KernelFunction::Linear,
        );
        let model = SupportVectorModel::new(
            KernelFunction::Linear,
            array![[2.0], [-2.0]],
            array![0.125, -0.125],
            0.3,
        )
        .expect("valid model");
        // The negative multiplier sits at its bound, so only one class is on the margin
        let result = OptimizationResult {
            alpha: vec![0.125, 0.0, 10.0, 0.0],
            upper_bounds: vec![5.0, 5.0, 10.0, 10.0],
            b: 0.3,
            iterations: 1,
            converged: true,
            updates: 1,
            objective_value: 0.0,
        };

        assert_eq!(svm.calibrated_bias(&model, &dataset, &result), None);
        let finalized = svm.finalize(model, &dataset, &result);
        assert_eq!(finalized.bias(), 0.3);
    }
}
