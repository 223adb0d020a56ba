//! High-level API for SVM training, prediction and evaluation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use smosvm::api::SVM;
//! use smosvm::data::{Dataset, Delimiter};
//! use smosvm::kernel::KernelFunction;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let train = Dataset::from_file("train.txt", Delimiter::Whitespace)?;
//! let classifier = SVM::cost_sensitive(600.0, 100.0)
//!     .with_kernel(KernelFunction::rbf(1.3)?)
//!     .with_seed(42)
//!     .train(&train)?;
//!
//! let test = Dataset::from_file("test.txt", Delimiter::Whitespace)?;
//! let metrics = classifier.evaluate(&test)?;
//! println!("{:?}", metrics.as_map());
//! println!("Recall: {:.2}%", metrics.recall() * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{Prediction, Result, SVMError, SVMModel, TrainingConfig, TrainingReport};
use crate::data::{Dataset, Delimiter};
use crate::kernel::KernelFunction;
use crate::model::SupportVectorModel;
use crate::variants::{
    CostSensitive, CostSensitiveParams, MarginCalibrated, MarginCalibratedParams, SoftMargin,
    SoftMarginParams, TrainedSVM, Variant,
};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Variant together with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum VariantParams {
    SoftMargin(SoftMarginParams),
    CostSensitive(CostSensitiveParams),
    MarginCalibrated(MarginCalibratedParams),
}

impl VariantParams {
    /// Variant name as used on the command line and in saved models
    pub fn name(&self) -> &'static str {
        match self {
            Self::SoftMargin(_) => SoftMargin::NAME,
            Self::CostSensitive(_) => CostSensitive::NAME,
            Self::MarginCalibrated(_) => MarginCalibrated::NAME,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SoftMargin(p) => p.validate(),
            Self::CostSensitive(p) => p.validate(),
            Self::MarginCalibrated(p) => p.validate(),
        }
    }

    /// Parse a flat parameter vector for the named variant; trailing kernel
    /// parameters select the kernel
    pub fn from_flat(variant: &str, params: &[f64]) -> Result<(Self, KernelFunction)> {
        if variant == SoftMargin::NAME {
            let (p, kernel) = SoftMarginParams::from_slice(params)?;
            Ok((Self::SoftMargin(p), kernel))
        } else if variant == CostSensitive::NAME {
            let (p, kernel) = CostSensitiveParams::from_slice(params)?;
            Ok((Self::CostSensitive(p), kernel))
        } else if variant == MarginCalibrated::NAME {
            let (p, kernel) = MarginCalibratedParams::from_slice(params)?;
            Ok((Self::MarginCalibrated(p), kernel))
        } else {
            Err(SVMError::InvalidParameter(format!(
                "unknown variant '{variant}'"
            )))
        }
    }

    /// Parameters in flat form, without kernel parameters
    pub fn to_flat(&self) -> Vec<f64> {
        match *self {
            Self::SoftMargin(SoftMarginParams { c }) => vec![c],
            Self::CostSensitive(CostSensitiveParams { cp, cn }) => vec![cp, cn],
            Self::MarginCalibrated(MarginCalibratedParams { cp, cn, ap, an }) => {
                vec![cp, cn, ap, an]
            }
        }
    }
}

impl fmt::Display for VariantParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoftMargin(p) => write!(f, "{} (C={})", self.name(), p.c),
            Self::CostSensitive(p) => write!(f, "{} (Cp={}, Cn={})", self.name(), p.cp, p.cn),
            Self::MarginCalibrated(p) => write!(
                f,
                "{} (Cp={}, Cn={}, Ap={}, An={})",
                self.name(),
                p.cp,
                p.cn,
                p.ap,
                p.an
            ),
        }
    }
}

/// High-level SVM interface with builder pattern
#[derive(Debug, Clone)]
pub struct SVM {
    params: VariantParams,
    kernel: KernelFunction,
    config: TrainingConfig,
}

impl SVM {
    /// Train with the given variant parameters, a linear kernel and default settings
    pub fn new(params: VariantParams) -> Self {
        Self {
            params,
            kernel: KernelFunction::Linear,
            config: TrainingConfig::default(),
        }
    }

    /// Soft-margin SVM with box constraint `c`
    pub fn soft_margin(c: f64) -> Self {
        Self::new(VariantParams::SoftMargin(SoftMarginParams { c }))
    }

    /// Cost-sensitive SVM with class costs `cp` and `cn`
    pub fn cost_sensitive(cp: f64, cn: f64) -> Self {
        Self::new(VariantParams::CostSensitive(CostSensitiveParams { cp, cn }))
    }

    /// Margin-calibrated SVM with class costs and margin factors
    pub fn margin_calibrated(cp: f64, cn: f64, ap: f64, an: f64) -> Self {
        Self::new(VariantParams::MarginCalibrated(MarginCalibratedParams {
            cp,
            cn,
            ap,
            an,
        }))
    }

    /// Set the kernel
    pub fn with_kernel(mut self, kernel: KernelFunction) -> Self {
        self.kernel = kernel;
        self
    }

    /// Replace the whole training configuration
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum number of outer passes
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the KKT tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Fix the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn params(&self) -> &VariantParams {
        &self.params
    }

    /// Train on a dataset
    ///
    /// # Errors
    /// Invalid parameters or configuration, non-finite features, or a dataset
    /// that does not contain both classes.
    pub fn train(self, dataset: &Dataset) -> Result<TrainedClassifier> {
        self.params.validate()?;
        self.kernel.validate()?;
        self.config.validate()?;

        let trained = match self.params {
            VariantParams::SoftMargin(p) => SoftMargin::new(p, self.kernel)
                .with_config(self.config.clone())
                .train(dataset)?,
            VariantParams::CostSensitive(p) => CostSensitive::new(p, self.kernel)
                .with_config(self.config.clone())
                .train(dataset)?,
            VariantParams::MarginCalibrated(p) => MarginCalibrated::new(p, self.kernel)
                .with_config(self.config.clone())
                .train(dataset)?,
        };

        let training_metrics = evaluate(&trained.model, dataset)?;
        Ok(TrainedClassifier {
            trained,
            params: self.params,
            config: self.config,
            training_metrics,
        })
    }

    /// Train from a delimited text file
    pub fn train_from_file<P: AsRef<Path>>(
        self,
        path: P,
        delimiter: Delimiter,
    ) -> Result<TrainedClassifier> {
        let dataset = Dataset::from_file(path, delimiter)?;
        self.train(&dataset)
    }
}

/// Trained SVM with high-level prediction interface
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    trained: TrainedSVM,
    params: VariantParams,
    config: TrainingConfig,
    training_metrics: EvaluationMetrics,
}

impl TrainedClassifier {
    /// Predict a single sample
    pub fn predict(&self, x: ArrayView1<f64>) -> Prediction {
        self.trained.model.predict(x)
    }

    /// Predict every row of a feature matrix
    pub fn predict_batch(&self, x: ArrayView2<f64>) -> Vec<Prediction> {
        self.trained.model.predict_batch(x)
    }

    /// Predict every sample of a dataset
    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Vec<Prediction>> {
        check_dim(&self.trained.model, dataset)?;
        Ok(self.predict_batch(dataset.features()))
    }

    /// Confusion counts on a labeled dataset
    pub fn evaluate(&self, dataset: &Dataset) -> Result<EvaluationMetrics> {
        evaluate(&self.trained.model, dataset)
    }

    /// Confusion counts on a delimited text file
    pub fn evaluate_from_file<P: AsRef<Path>>(
        &self,
        path: P,
        delimiter: Delimiter,
    ) -> Result<EvaluationMetrics> {
        let dataset = Dataset::from_file(path, delimiter)?;
        self.evaluate(&dataset)
    }

    /// Confusion counts on the samples the model was trained on
    pub fn evaluate_training_set(&self) -> &EvaluationMetrics {
        &self.training_metrics
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            variant: self.params,
            kernel: *self.trained.model.kernel(),
            n_support_vectors: self.trained.model.n_support_vectors(),
            bias: self.trained.model.bias(),
            solver_bias: self.trained.solver_bias,
            report: self.trained.report.clone(),
        }
    }

    pub fn model(&self) -> &SupportVectorModel {
        &self.trained.model
    }

    pub fn report(&self) -> &TrainingReport {
        &self.trained.report
    }

    /// Primal weight vector `Σ α_i y_i x_i`
    pub fn weight_vector(&self) -> &Array1<f64> {
        &self.trained.weight_vector
    }

    pub fn params(&self) -> &VariantParams {
        &self.params
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Get the underlying training output
    pub fn inner(&self) -> &TrainedSVM {
        &self.trained
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub variant: VariantParams,
    pub kernel: KernelFunction,
    pub n_support_vectors: usize,
    pub bias: f64,
    pub solver_bias: f64,
    pub report: TrainingReport,
}

fn check_dim(model: &SupportVectorModel, dataset: &Dataset) -> Result<()> {
    if model.n_support_vectors() > 0 && model.dim() != dataset.dim() {
        return Err(SVMError::DimensionMismatch {
            expected: model.dim(),
            actual: dataset.dim(),
        });
    }
    Ok(())
}

/// Predict every sample and tally the confusion counts, `+1` being positive
pub fn evaluate(model: &SupportVectorModel, dataset: &Dataset) -> Result<EvaluationMetrics> {
    check_dim(model, dataset)?;
    let predictions = model.predict_batch(dataset.features());
    Ok(EvaluationMetrics::from_predictions(
        &predictions,
        dataset.labels(),
    ))
}

/// Confusion counts of a binary classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Tally predictions against true labels; extra entries on either side are ignored
    pub fn from_predictions(predictions: &[Prediction], labels: &[f64]) -> Self {
        let mut metrics = Self::default();
        for (pred, &actual) in predictions.iter().zip(labels) {
            match (pred.is_positive(), actual > 0.0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }

    /// The counts keyed by `TP`, `TN`, `FP` and `FN`
    pub fn as_map(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("TP", self.true_positives),
            ("TN", self.true_negatives),
            ("FP", self.false_positives),
            ("FN", self.false_negatives),
        ])
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
