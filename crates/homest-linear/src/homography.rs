//! Homography estimation (plane-induced projective transform).
//!
//! Implements the normalized Direct Linear Transform (DLT) and a robust
//! RANSAC wrapper. The homography `H` maps points of the first set to the
//! second: `x' ~ H x`, defined up to scale.
//!
//! Input point sets are homogeneous 3xN matrices aligned by column;
//! normalization is applied internally for numerical stability and the
//! output is de-normalized.

use crate::math::{condition_number, hartley_normalize, mat3_from_svd_row};
use homest_core::{
    ransac_fit, Estimator, Mat3, PointSet, RansacOptions, Real, Vec3,
};
use log::debug;
use nalgebra::DMatrix;
use thiserror::Error;

/// Candidates whose condition number exceeds `e^MAX_LOG_CONDITION` are
/// treated as numerically unusable and classified with zero inliers.
pub const MAX_LOG_CONDITION: Real = 15.0;

/// Errors that can occur during homography estimation.
#[derive(Debug, Error)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("degenerate point configuration for normalization")]
    DegenerateConfiguration,
    #[error("svd failed")]
    SvdFailed,
    #[error("fitted homography has non-finite entries")]
    NonFiniteModel,
    #[error("ransac failed to find a consensus homography")]
    NoConsensus,
}

/// Conditioning transform for a point set (Hartley normalization).
///
/// Returns the similarity transform `T` that centers the set at the origin
/// with mean distance `√2`. This is the transform the DLT solver applies to
/// both point sets before building its design matrix.
pub fn normalize_points(points: &PointSet) -> Result<Mat3, HomographyError> {
    hartley_normalize(points)
        .map(|(_, t)| t)
        .ok_or(HomographyError::DegenerateConfiguration)
}

/// Estimate `H` such that `x' ~ H x` using the normalized DLT.
///
/// Both sets must hold at least 4 correspondences. The design matrix is
/// built from the full homogeneous bilinear form, so point weights other
/// than 1 are handled. The returned homography is scaled so that
/// `H[2,2] == 1` when that entry is not vanishing.
///
/// An ill-conditioned but finite result (e.g. from near-collinear sample
/// points) is **not** rejected here; that is [`classify_inliers`]'s job.
pub fn fit_homography(points1: &PointSet, points2: &PointSet) -> Result<Mat3, HomographyError> {
    let n = points1.ncols();
    if n < 4 || points2.ncols() != n {
        return Err(HomographyError::NotEnoughPoints(n.min(points2.ncols())));
    }

    let (p1, t1) =
        hartley_normalize(points1).ok_or(HomographyError::DegenerateConfiguration)?;
    let (p2, t2) =
        hartley_normalize(points2).ok_or(HomographyError::DegenerateConfiguration)?;

    let mut a = DMatrix::<Real>::zeros(2 * n, 9);

    for i in 0..n {
        let (x1, y1, w1) = (p1[(0, i)], p1[(1, i)], p1[(2, i)]);
        let (x2, y2, w2) = (p2[(0, i)], p2[(1, i)], p2[(2, i)]);

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 3)] = -w2 * x1;
        a[(r0, 4)] = -w2 * y1;
        a[(r0, 5)] = -w2 * w1;
        a[(r0, 6)] = y2 * x1;
        a[(r0, 7)] = y2 * y1;
        a[(r0, 8)] = y2 * w1;

        a[(r1, 0)] = w2 * x1;
        a[(r1, 1)] = w2 * y1;
        a[(r1, 2)] = w2 * w1;
        a[(r1, 6)] = -x2 * x1;
        a[(r1, 7)] = -x2 * y1;
        a[(r1, 8)] = -x2 * w1;
    }

    // Solve A h = 0 via SVD: take the singular vector for the smallest
    // singular value. Pad with zero rows when 2n < 9 so V^T is square and
    // contains the null-space row.
    let mut a_work = a;
    if a_work.nrows() < a_work.ncols() {
        let rows = a_work.nrows();
        let cols = a_work.ncols();
        let mut a_pad = DMatrix::<Real>::zeros(cols, cols);
        a_pad.view_mut((0, 0), (rows, cols)).copy_from(&a_work);
        a_work = a_pad;
    }

    let svd = a_work.svd(false, true);
    let v_t = svd.v_t.ok_or(HomographyError::SvdFailed)?;
    let h_norm = mat3_from_svd_row(&v_t, v_t.nrows() - 1);

    // Denormalize: H = T2⁺ · H_norm · T1. T2 is a similarity transform and
    // invertible whenever normalization succeeded; the pseudo-inverse covers
    // the numerical edge cases.
    let t2_pinv = match t2.try_inverse() {
        Some(inv) => inv,
        None => t2
            .svd(true, true)
            .pseudo_inverse(1e-12)
            .map_err(|_| HomographyError::SvdFailed)?,
    };
    let mut h = t2_pinv * h_norm * t1;

    // normalise such that H[2,2] = 1
    let scale = h[(2, 2)];
    if scale.abs() > Real::EPSILON {
        h /= scale;
    }

    if h.iter().any(|v| !v.is_finite()) {
        return Err(HomographyError::NonFiniteModel);
    }

    Ok(h)
}

/// Whether a homography can be used for reprojection at all.
///
/// Rejects matrices with non-finite entries and those whose condition number
/// `σ_max/σ_min` satisfies `|ln(cond)| > 15`.
pub fn is_usable_homography(h: &Mat3) -> bool {
    if h.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let cond = condition_number(h);
    cond.is_finite() && cond.ln().abs() <= MAX_LOG_CONDITION
}

fn reprojection_distance(h: &Mat3, src: &Vec3, dst: &Vec3) -> Real {
    let q = h * src;
    let qx = q[0] / q[2];
    let qy = q[1] / q[2];
    let tx = dst[0] / dst[2];
    let ty = dst[1] / dst[2];
    let dx = qx - tx;
    let dy = qy - ty;
    (dx * dx + dy * dy).sqrt()
}

/// Classify correspondences as inliers of `h` under a reprojection-error
/// threshold.
///
/// Each point of the first set is transferred through `h`, dehomogenized,
/// and compared to its counterpart by Euclidean distance in the plane. An
/// index is an inlier iff `distance < threshold` (strict: a point exactly at
/// the threshold is excluded).
///
/// A numerically unusable `h` (see [`is_usable_homography`]) yields an empty
/// set without any reprojection. A transferred point landing on the line at
/// infinity produces a non-finite distance and is excluded by the strict
/// comparison rather than poisoning the set.
pub fn classify_inliers(
    h: &Mat3,
    points1: &PointSet,
    points2: &PointSet,
    threshold: Real,
) -> Vec<usize> {
    if !is_usable_homography(h) {
        return Vec::new();
    }

    let n = points1.ncols().min(points2.ncols());
    let mut inliers = Vec::new();
    for i in 0..n {
        let src = points1.column(i).into_owned();
        let dst = points2.column(i).into_owned();
        if reprojection_distance(h, &src, &dst) < threshold {
            inliers.push(i);
        }
    }
    inliers
}

#[derive(Clone)]
struct CorrespondenceDatum {
    src: Vec3,
    dst: Vec3,
}

fn gather(data: &[CorrespondenceDatum], indices: &[usize]) -> (PointSet, PointSet) {
    let p1 = PointSet::from_fn(indices.len(), |r, c| data[indices[c]].src[r]);
    let p2 = PointSet::from_fn(indices.len(), |r, c| data[indices[c]].dst[r]);
    (p1, p2)
}

struct HomographyEst;

impl Estimator for HomographyEst {
    type Datum = CorrespondenceDatum;
    type Model = Mat3;

    const MIN_SAMPLES: usize = 4;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        let (p1, p2) = gather(data, sample_indices);
        fit_homography(&p1, &p2).ok()
    }

    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
        reprojection_distance(model, &datum.src, &datum.dst)
    }

    fn is_degenerate(data: &[Self::Datum], sample_indices: &[usize]) -> bool {
        // A 4-sample with any 3 collinear source points spans a
        // rank-deficient design matrix.
        let pts: Vec<_> = sample_indices
            .iter()
            .map(|&idx| {
                let s = &data[idx].src;
                (s[0] / s[2], s[1] / s[2])
            })
            .collect();
        for skip in 0..pts.len() {
            let tri: Vec<_> = (0..pts.len()).filter(|&k| k != skip).collect();
            if tri.len() < 3 {
                continue;
            }
            let (p0, p1, p2) = (pts[tri[0]], pts[tri[1]], pts[tri[2]]);
            let area = (p1.0 - p0.0) * (p2.1 - p0.1) - (p1.1 - p0.1) * (p2.0 - p0.0);
            if area.abs() < 1e-9 {
                return true;
            }
        }
        false
    }

    fn is_valid_model(model: &Self::Model) -> bool {
        is_usable_homography(model)
    }

    fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
        if inliers.len() < 4 {
            return None;
        }
        let (p1, p2) = gather(data, inliers);
        fit_homography(&p1, &p2).ok()
    }
}

/// Robustly estimate a homography with DLT inside a RANSAC loop.
///
/// Draws minimal 4-point samples, classifies inliers over the full sets with
/// the strict threshold of [`classify_inliers`], keeps the largest consensus
/// and refits once on the winning inlier set. The iteration budget adapts to
/// the best inlier fraction found so far, bounded by `opts.max_iters`.
///
/// Returns the refit homography and the inlier indices, or
/// [`HomographyError::NoConsensus`] when no candidate reaches
/// `opts.min_inliers` supporters.
pub fn estimate_homography_ransac(
    points1: &PointSet,
    points2: &PointSet,
    opts: &RansacOptions,
) -> Result<(Mat3, Vec<usize>), HomographyError> {
    let n = points1.ncols();
    if n < 4 || points2.ncols() != n {
        return Err(HomographyError::NotEnoughPoints(n.min(points2.ncols())));
    }

    let data: Vec<CorrespondenceDatum> = (0..n)
        .map(|i| CorrespondenceDatum {
            src: points1.column(i).into_owned(),
            dst: points2.column(i).into_owned(),
        })
        .collect();

    let res = ransac_fit::<HomographyEst>(&data, opts);
    let h = match res.model {
        Some(h) if res.success => h,
        _ => return Err(HomographyError::NoConsensus),
    };
    debug!(
        "homography consensus: {} of {} correspondences in {} iterations",
        res.inliers.len(),
        n,
        res.iters
    );
    Ok((h, res.inliers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use homest_core::{point_set_from_pixels, Pt2};

    fn unit_square() -> PointSet {
        point_set_from_pixels(&[
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ])
    }

    fn scaled_square() -> PointSet {
        point_set_from_pixels(&[
            Pt2::new(0.0, 0.0),
            Pt2::new(2.0, 0.0),
            Pt2::new(2.0, 2.0),
            Pt2::new(0.0, 2.0),
        ])
    }

    #[test]
    fn basic_homography() {
        let h = fit_homography(&unit_square(), &scaled_square()).unwrap();
        let s = h[(0, 0)];
        assert!((s - 2.0).abs() < 1e-6);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let p = point_set_from_pixels(&[
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
        ]);
        let err = fit_homography(&p, &p).unwrap_err();
        assert!(matches!(err, HomographyError::NotEnoughPoints(3)));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let p = point_set_from_pixels(&[
            Pt2::new(1.0, 1.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(1.0, 1.0),
        ]);
        let err = fit_homography(&p, &scaled_square()).unwrap_err();
        assert!(matches!(err, HomographyError::DegenerateConfiguration));

        assert!(matches!(
            normalize_points(&p),
            Err(HomographyError::DegenerateConfiguration)
        ));
    }

    #[test]
    fn classifier_rejects_unusable_homographies() {
        let p1 = unit_square();
        let p2 = scaled_square();

        let near_singular = Mat3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1e-8);
        assert!(classify_inliers(&near_singular, &p1, &p2, 10.0).is_empty());

        let mut poisoned = Mat3::identity();
        poisoned[(0, 2)] = Real::NAN;
        assert!(classify_inliers(&poisoned, &p1, &p2, 10.0).is_empty());
    }

    #[test]
    fn classifier_threshold_is_strict() {
        // Pure translation by 1 pixel in x: every reprojection error is
        // exactly 1, which a threshold of 1 must exclude.
        let p1 = unit_square();
        let h = Mat3::new(1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);

        assert!(classify_inliers(&h, &p1, &p1, 1.0).is_empty());
        assert_eq!(classify_inliers(&h, &p1, &p1, 1.0 + 1e-9), vec![0, 1, 2, 3]);
    }

    #[test]
    fn ransac_handles_outliers() {
        let mut src = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
            Pt2::new(0.3, 0.7),
            Pt2::new(0.8, 0.2),
        ];
        let mut dst: Vec<Pt2> = src.iter().map(|p| Pt2::new(2.0 * p.x, 2.0 * p.y)).collect();

        // A couple of mismatched correspondences as outliers.
        src.push(Pt2::new(0.5, 0.5));
        dst.push(Pt2::new(10.0, -3.0));
        src.push(Pt2::new(-0.2, 0.3));
        dst.push(Pt2::new(-5.0, 7.0));

        let opts = RansacOptions {
            max_iters: 200,
            thresh: 0.1,
            min_inliers: 5,
            confidence: 0.99,
            seed: 7,
        };

        let (h, inliers) =
            estimate_homography_ransac(&point_set_from_pixels(&src), &point_set_from_pixels(&dst), &opts)
                .unwrap();

        // The inliers should at least include the six good correspondences.
        assert!(inliers.len() >= 6);
        assert!(!inliers.contains(&6));
        assert!(!inliers.contains(&7));
        let scale = h[(0, 0)];
        assert!((scale - 2.0).abs() < 1e-6);
    }
}
