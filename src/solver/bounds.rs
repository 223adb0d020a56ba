//! Per-sample upper bounds on the Lagrange multipliers
//!
//! Each SVM variant differs from the others only in how it bounds `α_i`, so the
//! bound is a strategy injected into the solver instead of a solver subclass.

use std::fmt::Debug;

/// Maps a sample to its upper bound `C_i`, so that `0 <= α_i <= C_i`
pub trait BoundPolicy: Send + Sync + Debug {
    /// Upper bound for a sample carrying `label` (+1 or -1)
    fn bound_for(&self, label: f64) -> f64;
}

/// Same box constraint `C` for every sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftMarginBounds {
    pub c: f64,
}

impl BoundPolicy for SoftMarginBounds {
    fn bound_for(&self, _label: f64) -> f64 {
        self.c
    }
}

/// Class-dependent box constraints.
///
/// Positive samples are bounded by `cn` and negative samples by `cp`: each
/// class is tied to the misclassification cost of the other one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSensitiveBounds {
    pub cp: f64,
    pub cn: f64,
}

impl BoundPolicy for CostSensitiveBounds {
    fn bound_for(&self, label: f64) -> f64 {
        if label == 1.0 {
            self.cn
        } else {
            self.cp
        }
    }
}

/// Cost-sensitive bounds shrunk by the margin factors `ap`, `an` in `(0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginCalibratedBounds {
    pub cp: f64,
    pub cn: f64,
    pub ap: f64,
    pub an: f64,
}

impl BoundPolicy for MarginCalibratedBounds {
    fn bound_for(&self, label: f64) -> f64 {
        if label == 1.0 {
            self.cn * self.an
        } else {
            self.cp * self.ap
        }
    }
}
