//! Generic, model-agnostic RANSAC implementation.
//!
//! To use this module, implement the [`Estimator`] trait for your model and
//! call [`ransac_fit`] with a slice of input data and some [`RansacOptions`].
//!
//! The loop keeps the candidate with the largest inlier consensus and shrinks
//! its iteration budget adaptively from the best inlier ratio observed so
//! far. The final model is refit once on the winning inlier set; there is no
//! per-iteration refit. When consensus is not found, [`ransac_fit`] returns a
//! [`RansacResult`] with `success == false` and `model == None` instead of
//! panicking.

use log::debug;
use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the generic RANSAC engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacOptions {
    /// Hard upper bound on the number of iterations. The adaptive budget may
    /// shrink below this and grow back, but never exceeds it.
    pub max_iters: usize,
    /// Inlier residual threshold (strict: a residual equal to the threshold
    /// is an outlier).
    pub thresh: f64,
    /// Minimum number of inliers required to accept a candidate as the best
    /// model. Keep this above the minimal sample size, otherwise a candidate
    /// can certify itself with the very points it was fit on.
    pub min_inliers: usize,
    /// Desired confidence level in `[0, 1]` for finding an outlier-free sample.
    pub confidence: f64,
    /// Random-number generator seed (for reproducibility).
    pub seed: u64,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            thresh: 2.0,
            min_inliers: 5,
            confidence: 0.99,
            seed: 1_234_567,
        }
    }
}

/// Output of a RANSAC run.
///
/// Check the [`success`](RansacResult::success) flag before using the model;
/// if it is `false`, then `model` is `None` and the other fields are
/// unspecified.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// Whether a consensus set satisfying the options was found.
    pub success: bool,
    /// Best model found (if any), refit on its full inlier set.
    pub model: Option<M>,
    /// Indices of inlier data points, ascending.
    pub inliers: Vec<usize>,
    /// Number of iterations actually performed.
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            success: false,
            model: None,
            inliers: Vec::new(),
            iters: 0,
        }
    }
}

/// Generic estimator for RANSAC-like methods.
///
/// Implement this for your geometric models: lines, homographies, etc.
pub trait Estimator {
    type Datum;
    type Model;

    /// Minimal number of samples needed to estimate a model.
    const MIN_SAMPLES: usize;

    /// Fit a model from a subset of data indices.
    ///
    /// Return `None` if the subset is degenerate or fitting fails.
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Residual/error for one datum (e.g. reprojection error, distance).
    ///
    /// This should be a **non-negative scalar** in the same units as
    /// `opts.thresh`. Non-finite residuals never pass the threshold test.
    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64;

    /// Optional degeneracy check on the sample subset.
    ///
    /// Default: assume non-degenerate.
    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Optional validity check on a fitted candidate before scoring.
    ///
    /// An invalid model is treated as having zero inliers: the iteration is
    /// wasted but the loop continues. Default: accept everything.
    fn is_valid_model(_model: &Self::Model) -> bool {
        true
    }

    /// Optional refit on the full inlier set, run once after the loop ends.
    ///
    /// Default: no refit; the minimal-sample model is kept.
    fn refit(_data: &[Self::Datum], _inliers: &[usize]) -> Option<Self::Model> {
        None
    }
}

/// Iteration budget needed to draw an all-inlier sample with the requested
/// confidence, given the best inlier ratio observed so far.
///
/// `N = log(1 - confidence) / log(1 - w^m)`, with the failure probability
/// clamped away from 0 and 1 so the logarithms stay finite. The result is
/// clamped to `[iters_so_far, hard_cap]`: the budget may grow again if the
/// best ratio was reached early, but never exceeds the caller's cap.
fn adaptive_max_iters(
    confidence: f64,
    inlier_ratio: f64,
    min_samples: usize,
    iters_so_far: usize,
    hard_cap: usize,
) -> usize {
    if confidence <= 0.0 || inlier_ratio <= 0.0 {
        return hard_cap;
    }

    let w = inlier_ratio.min(1.0);
    let p_fail = (1.0 - w.powi(min_samples as i32)).clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    let denom = p_fail.ln();
    if denom >= 0.0 {
        return hard_cap;
    }

    let n_iter = ((1.0 - confidence).ln() / denom).ceil();
    if !n_iter.is_finite() || n_iter >= hard_cap as f64 {
        return hard_cap;
    }
    (n_iter as usize).clamp(iters_so_far, hard_cap)
}

/// Run a generic RANSAC loop for a given [`Estimator`] implementation.
///
/// This function never panics under normal circumstances. If there is
/// insufficient data or no consensus model can be found within the iteration
/// budget, it returns a [`RansacResult`] with `success == false` and
/// `model == None`.
pub fn ransac_fit<E: Estimator>(data: &[E::Datum], opts: &RansacOptions) -> RansacResult<E::Model> {
    let mut best: RansacResult<E::Model> = RansacResult::default();

    if data.len() < E::MIN_SAMPLES {
        return best;
    }

    let all_indices: Vec<usize> = (0..data.len()).collect();
    let mut sample_idxs = vec![0usize; E::MIN_SAMPLES];

    let mut rng = StdRng::seed_from_u64(opts.seed);

    let mut budget = opts.max_iters;
    let mut best_sample_model: Option<E::Model> = None;
    let mut inliers = Vec::<usize>::new();

    let mut num_iters = 0;
    while num_iters < budget {
        num_iters += 1;

        // Draw a random sample of MIN_SAMPLES distinct indices
        all_indices
            .as_slice()
            .choose_multiple(&mut rng, E::MIN_SAMPLES)
            .enumerate()
            .for_each(|(k, &idx)| sample_idxs[k] = idx);

        if E::is_degenerate(data, &sample_idxs) {
            continue;
        }

        let Some(model) = E::fit(data, &sample_idxs) else {
            continue;
        };

        // Ill-conditioned candidates are absorbed here; the loop goes on.
        if !E::is_valid_model(&model) {
            continue;
        }

        inliers.clear();
        for (i, datum) in data.iter().enumerate() {
            if E::residual(&model, datum) < opts.thresh {
                inliers.push(i);
            }
        }

        if inliers.len() >= opts.min_inliers && inliers.len() > best.inliers.len() {
            debug!(
                "ransac: iteration {} found new best with {} inliers",
                num_iters,
                inliers.len()
            );
            best.inliers.clear();
            best.inliers.extend_from_slice(&inliers);
            best_sample_model = Some(model);
        }

        // The budget update is coupled to the best consensus so far, not to
        // the current candidate.
        let inlier_ratio = best.inliers.len() as f64 / data.len() as f64;
        budget = adaptive_max_iters(
            opts.confidence,
            inlier_ratio,
            E::MIN_SAMPLES,
            num_iters,
            opts.max_iters,
        );
    }

    best.iters = num_iters;
    if best.inliers.is_empty() {
        return best;
    }

    // Single final refit on the winning inlier set; fall back to the
    // minimal-sample model if the estimator does not support refitting.
    best.model = E::refit(data, &best.inliers).or(best_sample_model);
    best.success = best.model.is_some();
    best
}
