//! Model serialization and persistence
//!
//! Trained models are stored as JSON together with the parameters they were
//! trained with, so the CLI can predict with a model trained in another run.

use crate::api::{TrainedClassifier, VariantParams};
use crate::core::{Result, SVMError, SVMModel, TrainingConfig};
use crate::data::Dataset;
use crate::model::SupportVectorModel;
use crate::utils::scaling::ScalingParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained SVM model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Support vectors, weights, bias and kernel
    pub model: SupportVectorModel,
    /// Feature scaling fitted on the training set, applied before prediction
    #[serde(default)]
    pub scaling: Option<ScalingParams>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Variant and its parameters
    pub params: VariantParams,
    pub config: TrainingConfig,
    pub n_support_vectors: usize,
    pub n_features: usize,
    /// Bias before variant-specific recalibration
    pub solver_bias: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl SerializableModel {
    /// Capture a trained classifier
    pub fn from_classifier(classifier: &TrainedClassifier) -> Self {
        let model = classifier.model().clone();
        let report = classifier.report();
        Self {
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                params: *classifier.params(),
                config: classifier.config().clone(),
                n_support_vectors: model.n_support_vectors(),
                n_features: model.dim(),
                solver_bias: classifier.inner().solver_bias,
                iterations: report.iterations,
                converged: report.converged,
                created_at: Utc::now(),
            },
            model,
            scaling: None,
        }
    }

    /// Attach the scaling the training set was transformed with
    pub fn with_scaling(mut self, scaling: ScalingParams) -> Self {
        self.scaling = Some(scaling);
        self
    }

    /// Apply the stored scaling, if any, to a dataset
    pub fn prepare(&self, dataset: Dataset) -> Result<Dataset> {
        match &self.scaling {
            Some(scaling) => scaling.transform_dataset(&dataset),
            None => Ok(dataset),
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    ///
    /// The stored model is rebuilt through [`SupportVectorModel::new`], so a
    /// file with inconsistent shapes or kernel parameters is rejected.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let loaded: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<()> {
        SupportVectorModel::new(
            *self.model.kernel(),
            self.model.support_vectors().to_owned(),
            self.model.weights().to_owned(),
            self.model.bias(),
        )?;
        if let Some(scaling) = &self.scaling {
            if scaling.dim() != self.metadata.n_features {
                return Err(SVMError::DimensionMismatch {
                    expected: self.metadata.n_features,
                    actual: scaling.dim(),
                });
            }
        }
        self.metadata.params.validate()
    }

    /// The model, ready for prediction
    pub fn to_model(&self) -> SupportVectorModel {
        self.model.clone()
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== SVM Model Summary ===");
        println!("Variant: {}", self.metadata.params);
        println!("Kernel: {}", self.model.kernel());
        println!("Features: {}", self.metadata.n_features);
        println!("Support Vectors: {}", self.metadata.n_support_vectors);
        println!("Bias: {:.6}", self.model.bias());
        if let Some(scaling) = &self.scaling {
            println!("Scaling: {:?}", scaling.method);
        }
        println!("Solver Bias: {:.6}", self.metadata.solver_bias);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at.to_rfc3339());
        println!("Training:");
        println!("  Passes: {}", self.metadata.iterations);
        println!("  Converged: {}", self.metadata.converged);
        println!("  Max Iterations: {}", self.metadata.config.max_iterations);
        println!("  Tolerance: {}", self.metadata.config.tolerance);
    }
}
