//! Cost-sensitive SVM with one box constraint per class

use crate::core::{Result, TrainingConfig};
use crate::kernel::KernelFunction;
use crate::solver::CostSensitiveBounds;
use crate::variants::{check_cost, split_params, Variant};
use serde::{Deserialize, Serialize};

/// Misclassification costs of the positive (`cp`) and negative (`cn`) class.
///
/// Positive samples are bounded by `cn` and negative samples by `cp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSensitiveParams {
    pub cp: f64,
    pub cn: f64,
}

impl CostSensitiveParams {
    pub fn new(cp: f64, cn: f64) -> Result<Self> {
        let params = Self { cp, cn };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        check_cost("Cp", self.cp)?;
        check_cost("Cn", self.cn)
    }

    /// Parse the flat layout `[Cp, Cn]` or `[Cp, Cn, width]`
    pub fn from_slice(params: &[f64]) -> Result<(Self, KernelFunction)> {
        let (own, kernel) = split_params(CostSensitive::NAME, params, 2)?;
        Ok((Self::new(own[0], own[1])?, kernel))
    }
}

#[derive(Debug, Clone)]
pub struct CostSensitive {
    params: CostSensitiveParams,
    kernel: KernelFunction,
    config: TrainingConfig,
}

impl CostSensitive {
    pub fn new(params: CostSensitiveParams, kernel: KernelFunction) -> Self {
        Self {
            params,
            kernel,
            config: TrainingConfig::default(),
        }
    }

    /// Build from a flat parameter vector (see [`CostSensitiveParams::from_slice`])
    pub fn from_params(params: &[f64]) -> Result<Self> {
        let (params, kernel) = CostSensitiveParams::from_slice(params)?;
        Ok(Self::new(params, kernel))
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn params(&self) -> &CostSensitiveParams {
        &self.params
    }
}

impl Variant for CostSensitive {
    type Bounds = CostSensitiveBounds;
    const NAME: &'static str = "cost-sensitive";

    fn bounds(&self) -> CostSensitiveBounds {
        CostSensitiveBounds {
            cp: self.params.cp,
            cn: self.params.cn,
        }
    }

    fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    fn config(&self) -> &TrainingConfig {
        &self.config
    }
}
