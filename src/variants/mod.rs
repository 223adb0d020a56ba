//! SMO-trained SVM variants
//!
//! Every variant runs the same solver and differs in two places only: the
//! [`BoundPolicy`] it hands to the solver and an optional finalization step
//! applied to the extracted model.

pub mod cost_sensitive;
pub mod margin_calibrated;
pub mod soft_margin;

pub use self::cost_sensitive::*;
pub use self::margin_calibrated::*;
pub use self::soft_margin::*;

use crate::core::{OptimizationResult, Result, SVMError, SVMModel, TrainingConfig, TrainingReport};
use crate::data::Dataset;
use crate::kernel::{GramMatrix, KernelFunction};
use crate::model::{weight_vector, SupportVectorModel};
use crate::solver::{BoundPolicy, SMOSolver};
use log::info;
use ndarray::Array1;

/// Output of a training run
#[derive(Debug, Clone)]
pub struct TrainedSVM {
    /// Model used for inference
    pub model: SupportVectorModel,
    /// Primal weight vector `Σ α_i y_i x_i` over the training set
    pub weight_vector: Array1<f64>,
    /// Bias produced by the solver, before any variant-specific correction
    pub solver_bias: f64,
    pub report: TrainingReport,
}

impl TrainedSVM {
    /// Bias actually used by the model
    pub fn bias(&self) -> f64 {
        self.model.bias()
    }
}

/// A configured SVM variant that can be trained on a dataset
pub trait Variant {
    type Bounds: BoundPolicy;

    /// Short name used in logs, errors and saved models
    const NAME: &'static str;

    /// Multiplier bounds handed to the solver
    fn bounds(&self) -> Self::Bounds;

    fn kernel(&self) -> &KernelFunction;

    fn config(&self) -> &TrainingConfig;

    /// Variant-specific post-processing of the extracted model
    fn finalize(
        &self,
        model: SupportVectorModel,
        _dataset: &Dataset,
        _result: &OptimizationResult,
    ) -> SupportVectorModel {
        model
    }

    /// Train on a dataset, computing its Gram matrix first
    fn train(&self, dataset: &Dataset) -> Result<TrainedSVM> {
        check_finite(dataset)?;
        let gram = GramMatrix::compute(self.kernel(), dataset.features());
        self.train_with_gram(dataset, &gram)
    }

    /// Train with a Gram matrix computed beforehand with the same kernel.
    ///
    /// The matrix is only read, so it can be reused across runs that differ in
    /// their bound parameters.
    fn train_with_gram(&self, dataset: &Dataset, gram: &GramMatrix) -> Result<TrainedSVM> {
        check_finite(dataset)?;
        let (positives, negatives) = dataset.class_counts();
        info!(
            "Training {} SVM ({} kernel) on {} samples ({positives} positive, {negatives} negative)",
            Self::NAME,
            self.kernel(),
            dataset.len()
        );

        let solver = SMOSolver::new(gram, dataset.labels(), self.bounds(), self.config().clone())?;
        let result = solver.solve();
        let report = result.report();
        info!(
            "{} training done: {} passes, converged = {}, {} support vectors ({} on the margin)",
            Self::NAME,
            report.iterations,
            report.converged,
            report.n_support_vectors,
            report.n_margin_support_vectors
        );

        let weight_vector = weight_vector(dataset.features(), dataset.labels(), &result.alpha);
        let model = SupportVectorModel::from_solution(
            *self.kernel(),
            dataset.features(),
            dataset.labels(),
            &result,
        );
        let model = self.finalize(model, dataset, &result);

        Ok(TrainedSVM {
            model,
            weight_vector,
            solver_bias: result.b,
            report,
        })
    }
}

fn check_finite(dataset: &Dataset) -> Result<()> {
    if dataset.is_finite() {
        Ok(())
    } else {
        Err(SVMError::InvalidDataset(
            "feature matrix contains NaN or infinite values".to_string(),
        ))
    }
}

/// Box constraints must be positive and finite
pub(crate) fn check_cost(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "{name} must be positive and finite, got: {value}"
        )))
    }
}

/// Split a flat `[variant params..., kernel params...]` vector
pub(crate) fn split_params<'a>(
    variant: &'static str,
    params: &'a [f64],
    count: usize,
) -> Result<(&'a [f64], KernelFunction)> {
    let arity_error = || SVMError::ParameterCount {
        variant,
        expected: format!("{count} or {}", count + 1),
        actual: params.len(),
    };
    if params.len() < count {
        return Err(arity_error());
    }
    let (own, kernel_params) = params.split_at(count);
    let kernel = KernelFunction::from_params(kernel_params).ok_or_else(arity_error)??;
    Ok((own, kernel))
}
