//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the SVM dual problem by repeatedly optimizing pairs of Lagrange
//! multipliers over a precomputed Gram matrix. The feasible box of every
//! multiplier comes from an injected [`BoundPolicy`].

use crate::core::{OptimizationResult, Result, SVMError, TrainingConfig};
use crate::kernel::GramMatrix;
use crate::solver::bounds::BoundPolicy;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Cached prediction error `E_k = f(x_k) - y_k`.
///
/// Only a selection heuristic: the error used in an update is always recomputed.
#[derive(Debug, Clone, Copy, Default)]
struct ErrorEntry {
    valid: bool,
    value: f64,
}

/// SMO solver for SVM optimization
///
/// Owns the mutable optimization state (multipliers, error cache, bias and the
/// random source); the Gram matrix and labels are only borrowed. A solver is
/// single-threaded, but several solvers may share one Gram matrix.
pub struct SMOSolver<'a, B: BoundPolicy> {
    gram: &'a GramMatrix,
    labels: &'a [f64],
    bounds: B,
    config: TrainingConfig,
    upper: Vec<f64>,
    alpha: Vec<f64>,
    error_cache: Vec<ErrorEntry>,
    b: f64,
    rng: StdRng,
}

impl<'a, B: BoundPolicy> SMOSolver<'a, B> {
    /// Create a solver over a Gram matrix and its labels
    ///
    /// # Errors
    /// Fails on an invalid configuration, on a label outside {+1, -1}, on a
    /// non-positive bound, or when the data does not contain both classes.
    pub fn new(
        gram: &'a GramMatrix,
        labels: &'a [f64],
        bounds: B,
        config: TrainingConfig,
    ) -> Result<Self> {
        config.validate()?;

        let m = labels.len();
        if m == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if gram.size() != m {
            return Err(SVMError::DimensionMismatch {
                expected: m,
                actual: gram.size(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l != 1.0 && l != -1.0) {
            return Err(SVMError::InvalidLabel(bad));
        }
        if m < 2 {
            return Err(SVMError::InvalidDataset(
                "at least 2 samples are required".to_string(),
            ));
        }
        if !(labels.contains(&1.0) && labels.contains(&-1.0)) {
            return Err(SVMError::InvalidDataset(
                "both classes must be present".to_string(),
            ));
        }

        let upper: Vec<f64> = labels.iter().map(|&y| bounds.bound_for(y)).collect();
        if let Some(&bad) = upper.iter().find(|&&c| !(c.is_finite() && c > 0.0)) {
            return Err(SVMError::InvalidParameter(format!(
                "multiplier bound must be positive and finite, got: {bad}"
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            gram,
            labels,
            bounds,
            config,
            upper,
            alpha: vec![0.0; m],
            error_cache: vec![ErrorEntry::default(); m],
            b: 0.0,
            rng,
        })
    }

    /// Run the optimization until convergence or `max_iterations` passes
    pub fn solve(mut self) -> OptimizationResult {
        let m = self.labels.len();
        let mut examine_all = true;
        let mut iterations = 0;
        let mut updates = 0;
        let mut converged = false;

        loop {
            let mut num_changed = 0;
            if examine_all {
                for i in 0..m {
                    num_changed += self.optimize(i);
                }
            } else {
                for i in 0..m {
                    if self.is_non_bound(i) {
                        num_changed += self.optimize(i);
                    }
                }
            }

            iterations += 1;
            updates += num_changed;
            debug!(
                "pass {iterations} ({}): {num_changed} pair updates, b = {:.6}",
                if examine_all { "full" } else { "non-bound" },
                self.b
            );

            if examine_all && num_changed == 0 {
                converged = true;
                break;
            }
            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
            if iterations >= self.config.max_iterations {
                break;
            }
        }

        if converged {
            info!("SMO converged after {iterations} passes ({updates} pair updates)");
        } else {
            warn!(
                "SMO stopped at max_iterations = {} without convergence",
                self.config.max_iterations
            );
        }

        let objective_value = self.dual_objective();
        OptimizationResult {
            alpha: self.alpha,
            upper_bounds: self.upper,
            b: self.b,
            iterations,
            converged,
            updates,
            objective_value,
        }
    }

    /// Try to improve the multiplier of sample `i` together with a partner.
    ///
    /// Returns the number of pair updates made (0 or 1).
    pub fn optimize(&mut self, i: usize) -> usize {
        let e_i = self.error(i);
        if !self.violates_kkt(i, e_i) {
            return 0;
        }
        let j = self.select_second_variable(i, e_i);
        usize::from(self.take_step(i, j, e_i))
    }

    /// Current multipliers
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// Current bias
    pub fn bias(&self) -> f64 {
        self.b
    }

    /// Upper bound `C_i` of sample `i`
    pub fn bound_for(&self, i: usize) -> f64 {
        self.upper[i]
    }

    /// The active bound policy
    pub fn bounds(&self) -> &B {
        &self.bounds
    }

    /// `f(x_i) = Σ_k α_k y_k K(x_k, x_i) + b`
    fn decision_value(&self, i: usize) -> f64 {
        let k_i = self.gram.row(i);
        let sum: f64 = self
            .alpha
            .iter()
            .zip(self.labels)
            .zip(k_i.iter())
            .filter(|((&a, _), _)| a != 0.0)
            .map(|((&a, &y), &k)| a * y * k)
            .sum();
        sum + self.b
    }

    /// Prediction error `E_i = f(x_i) - y_i`
    fn error(&self, i: usize) -> f64 {
        self.decision_value(i) - self.labels[i]
    }

    fn violates_kkt(&self, i: usize, e_i: f64) -> bool {
        let r_i = self.labels[i] * e_i;
        let alpha_i = self.alpha[i];
        (r_i > self.config.tolerance && alpha_i > 0.0)
            || (r_i < -self.config.tolerance && alpha_i < self.upper[i])
    }

    fn is_non_bound(&self, i: usize) -> bool {
        self.alpha[i] > 0.0 && self.alpha[i] < self.upper[i]
    }

    /// Pick the partner maximizing |E_i - E_j| among cached errors, or a random
    /// index when fewer than two errors are cached.
    fn select_second_variable(&mut self, i: usize, e_i: f64) -> usize {
        self.error_cache[i] = ErrorEntry {
            valid: true,
            value: e_i,
        };

        let mut best_j = None;
        let mut max_diff = -1.0;
        let mut valid_count = 0;
        for (k, entry) in self.error_cache.iter().enumerate() {
            if !entry.valid {
                continue;
            }
            valid_count += 1;
            if k == i {
                continue;
            }
            let diff = (e_i - entry.value).abs();
            if diff > max_diff {
                max_diff = diff;
                best_j = Some(k);
            }
        }

        match best_j {
            Some(j) if valid_count > 1 => j,
            _ => self.select_random(i),
        }
    }

    /// Uniform draw from every index except `i`
    fn select_random(&mut self, i: usize) -> usize {
        let j = self.rng.gen_range(0..self.labels.len() - 1);
        if j >= i {
            j + 1
        } else {
            j
        }
    }

    /// Jointly optimize `α_i` and `α_j` along the constraint line
    fn take_step(&mut self, i: usize, j: usize, e_i: f64) -> bool {
        let y_i = self.labels[i];
        let y_j = self.labels[j];
        let alpha_i_old = self.alpha[i];
        let alpha_j_old = self.alpha[j];
        let c_i = self.upper[i];
        let c_j = self.upper[j];
        let e_j = self.error(j);
        let s = y_i * y_j;

        let (low, high) = if s < 0.0 {
            (
                0.0_f64.max(alpha_j_old - alpha_i_old),
                c_j.min(c_i + alpha_j_old - alpha_i_old),
            )
        } else {
            (
                0.0_f64.max(alpha_j_old + alpha_i_old - c_i),
                c_j.min(alpha_j_old + alpha_i_old),
            )
        };
        if low >= high {
            return false;
        }

        let k_ii = self.gram.get(i, i);
        let k_ij = self.gram.get(i, j);
        let k_jj = self.gram.get(j, j);
        let eta = 2.0 * k_ij - k_ii - k_jj;
        // No maximum along the line; the degenerate case is skipped
        if eta >= 0.0 {
            return false;
        }

        let alpha_j_new = (alpha_j_old + y_j * (e_j - e_i) / eta).clamp(low, high);
        if (alpha_j_new - alpha_j_old).abs() < self.config.min_step {
            return false;
        }
        // Rounding may leave α_i a hair outside its box
        let alpha_i_new = (alpha_i_old + s * (alpha_j_old - alpha_j_new)).clamp(0.0, c_i);

        self.alpha[i] = alpha_i_new;
        self.alpha[j] = alpha_j_new;

        let delta_i = alpha_i_new - alpha_i_old;
        let delta_j = alpha_j_new - alpha_j_old;
        let b1 = self.b - e_i - delta_i * y_i * k_ii - delta_j * y_j * k_ij;
        let b2 = self.b - e_j - delta_i * y_i * k_ij - delta_j * y_j * k_jj;

        self.b = if alpha_i_new > 0.0 && alpha_i_new < c_i {
            b1
        } else if alpha_j_new > 0.0 && alpha_j_new < c_j {
            b2
        } else {
            (b1 + b2) / 2.0
        };

        self.refresh_error(j);
        self.refresh_error(i);
        true
    }

    fn refresh_error(&mut self, k: usize) {
        self.error_cache[k] = ErrorEntry {
            valid: true,
            value: self.error(k),
        };
    }

    /// Dual objective `Σ α_i - ½ Σ_i Σ_j α_i α_j y_i y_j K(x_i, x_j)`
    pub fn dual_objective(&self) -> f64 {
        let m = self.labels.len();
        let mut quadratic = 0.0;
        for i in (0..m).filter(|&i| self.alpha[i] > 0.0) {
            for j in (0..m).filter(|&j| self.alpha[j] > 0.0) {
                quadratic += self.alpha[i]
                    * self.alpha[j]
                    * self.labels[i]
                    * self.labels[j]
                    * self.gram.get(i, j);
            }
        }
        self.alpha.iter().sum::<f64>() - 0.5 * quadratic
    }

    /// `Σ α_i y_i`, which every pair update leaves unchanged
    pub fn linear_constraint(&self) -> f64 {
        self.alpha
            .iter()
            .zip(self.labels)
            .map(|(&a, &y)| a * y)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LinearKernel;
    use crate::solver::bounds::{CostSensitiveBounds, MarginCalibratedBounds, SoftMarginBounds};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn seeded() -> TrainingConfig {
        TrainingConfig::default().with_seed(42)
    }

    /// Two overlapping clouds in 2D, deterministic
    fn overlapping_clouds() -> (Array2<f64>, Vec<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for k in 0..12 {
            let t = k as f64;
            rows.push([(t * 1.3).sin() + 0.6, (t * 0.7).cos()]);
            labels.push(1.0);
            rows.push([(t * 1.1).cos() - 0.6, (t * 0.9).sin()]);
            labels.push(-1.0);
        }
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let x = Array2::from_shape_vec((rows.len(), 2), flat).expect("shape");
        (x, labels)
    }

    #[test]
    fn test_rejects_mismatched_gram() {
        let x = array![[1.0], [-1.0], [2.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        let result = SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded());
        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_rejects_invalid_labels() {
        let x = array![[1.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, 0.5];
        let result = SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded());
        assert!(matches!(result, Err(SVMError::InvalidLabel(l)) if l == 0.5));
    }

    #[test]
    fn test_rejects_single_sample_and_single_class() {
        let x = array![[1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0];
        assert!(matches!(
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded()),
            Err(SVMError::InvalidDataset(_))
        ));

        let x = array![[1.0], [2.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, 1.0];
        assert!(matches!(
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded()),
            Err(SVMError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_bound() {
        let x = array![[1.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        let bounds = CostSensitiveBounds { cp: 1.0, cn: 0.0 };
        assert!(matches!(
            SMOSolver::new(&gram, &labels, bounds, seeded()),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        let x = array![[1.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        let config = seeded().with_max_iterations(0);
        assert!(SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, config).is_err());
    }

    #[test]
    fn test_two_point_closed_form_step() {
        // x = +1 (y = +1), x = -1 (y = -1): K = [[1, -1], [-1, 1]], eta = -4.
        // E = [-1, 1], so alpha_1 = 0 + (-1) * (1 - (-1)) / (-4) = 0.5 and
        // alpha_0 = 0 + (-1) * (0 - 0.5) = 0.5; both bias candidates are 0.
        let x = array![[1.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        let mut solver =
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 10.0 }, seeded()).expect("valid");

        let before = solver.dual_objective();
        assert_eq!(solver.optimize(0), 1);
        assert_abs_diff_eq!(solver.alpha()[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(solver.alpha()[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(solver.bias(), 0.0, epsilon = 1e-12);

        // Dual objective: 1.0 - 0.5 * (0.25 + 0.25 + 0.25 + 0.25) = 0.5
        let after = solver.dual_objective();
        assert_abs_diff_eq!(after, 0.5, epsilon = 1e-12);
        assert!(after > before);

        // Both points now sit exactly on the margin
        assert_eq!(solver.optimize(0), 0);
        assert_eq!(solver.optimize(1), 0);
    }

    #[test]
    fn test_degenerate_eta_is_skipped() {
        // Identical features with opposite labels: eta = 2 - 1 - 1 = 0
        let x = array![[1.0], [1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        let mut solver =
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded()).expect("valid");

        assert_eq!(solver.optimize(0), 0);
        assert_eq!(solver.alpha(), &[0.0, 0.0]);
        assert_eq!(solver.bias(), 0.0);
    }

    #[test]
    fn test_equal_bounds_pair_is_skipped() {
        // Same labels at alpha = 0 give L = H = 0
        let x = array![[1.0], [2.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, 1.0, -1.0];
        let mut solver =
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded()).expect("valid");

        let e_0 = solver.error(0);
        assert!(!solver.take_step(0, 1, e_0));
        assert_eq!(solver.alpha(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_small_step_is_discarded() {
        let x = array![[1.0], [-1.0]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0];
        // The closed-form step is 0.5, below this threshold
        let config = seeded().with_min_step(1.0);
        let mut solver =
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 10.0 }, config).expect("valid");

        assert_eq!(solver.optimize(0), 0);
        assert_eq!(solver.alpha(), &[0.0, 0.0]);
        assert_eq!(solver.bias(), 0.0);
    }

    #[test]
    fn test_box_and_linear_constraint_hold_after_every_step() {
        let (x, labels) = overlapping_clouds();
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let bounds = MarginCalibratedBounds {
            cp: 2.0,
            cn: 4.0,
            ap: 0.5,
            an: 0.8,
        };
        let mut solver = SMOSolver::new(&gram, &labels, bounds, seeded()).expect("valid");

        for _ in 0..5 {
            for i in 0..labels.len() {
                solver.optimize(i);
                for (k, &a) in solver.alpha().iter().enumerate() {
                    assert!(a >= 0.0, "alpha[{k}] = {a} below zero");
                    assert!(
                        a <= solver.bound_for(k),
                        "alpha[{k}] = {a} above bound {}",
                        solver.bound_for(k)
                    );
                }
                assert_abs_diff_eq!(solver.linear_constraint(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_invariants_for_every_policy() {
        let (x, labels) = overlapping_clouds();
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());

        let results = vec![
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded())
                .expect("valid")
                .solve(),
            SMOSolver::new(&gram, &labels, CostSensitiveBounds { cp: 0.5, cn: 3.0 }, seeded())
                .expect("valid")
                .solve(),
            SMOSolver::new(
                &gram,
                &labels,
                MarginCalibratedBounds {
                    cp: 2.0,
                    cn: 2.0,
                    ap: 0.3,
                    an: 0.9,
                },
                seeded(),
            )
            .expect("valid")
            .solve(),
        ];

        for result in &results {
            for (&a, &c) in result.alpha.iter().zip(&result.upper_bounds) {
                assert!((0.0..=c).contains(&a));
            }
            let constraint: f64 = result.alpha.iter().zip(&labels).map(|(a, y)| a * y).sum();
            assert_abs_diff_eq!(constraint, 0.0, epsilon = 1e-9);
            assert!(result.iterations >= 1);
            assert!(result.objective_value.is_finite());
            assert!(result.objective_value >= 0.0);
        }
    }

    #[test]
    fn test_max_iterations_caps_passes() {
        let (x, labels) = overlapping_clouds();
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let config = seeded().with_max_iterations(1);
        let result = SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, config)
            .expect("valid")
            .solve();

        assert_eq!(result.iterations, 1);
        // The first full sweep always finds violators on this data
        assert!(result.updates > 0);
        assert!(!result.converged);
    }

    #[test]
    fn test_separable_data_converges() {
        let x = array![[2.0, 2.0], [3.0, 3.0], [-2.0, -2.0], [-3.0, -3.0]];
        let labels = vec![1.0, 1.0, -1.0, -1.0];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let config = seeded().with_max_iterations(1000);
        let result = SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 100.0 }, config)
            .expect("valid")
            .solve();

        assert!(result.converged);
        assert!(result.iterations < 1000);
        assert!(result.alpha[0] > 0.0);
        assert!(result.alpha[2] > 0.0);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let (x, labels) = overlapping_clouds();
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());

        let run = || {
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 0.8 }, seeded())
                .expect("valid")
                .solve()
        };
        let first = run();
        let second = run();
        assert_eq!(first.alpha, second.alpha);
        assert_eq!(first.b, second.b);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn test_random_partner_never_equals_first_index() {
        let x = array![[1.0], [-1.0], [0.5]];
        let gram = GramMatrix::compute(&LinearKernel::new(), x.view());
        let labels = vec![1.0, -1.0, 1.0];
        let mut solver =
            SMOSolver::new(&gram, &labels, SoftMarginBounds { c: 1.0 }, seeded()).expect("valid");
        for i in 0..3 {
            for _ in 0..50 {
                let j = solver.select_random(i);
                assert_ne!(j, i);
                assert!(j < 3);
            }
        }
    }
}
