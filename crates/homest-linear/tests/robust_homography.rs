//! End-to-end properties of the robust homography pipeline on synthetic
//! correspondence sets.

use homest_core::synthetic::{apply_homography, corrupt_tail, sample_homography, scatter_points};
use homest_core::{Mat3, RansacOptions, Real};
use homest_linear::{classify_inliers, estimate_homography_ransac, fit_homography, HomographyError};

/// Relative Frobenius distance between two homographies after matching the
/// scale of `est` to `gt` (homographies are defined up to scale).
fn relative_homography_error(est: &Mat3, gt: &Mat3) -> Real {
    let dot: Real = est.iter().zip(gt.iter()).map(|(a, b)| a * b).sum();
    let nn: Real = est.iter().map(|a| a * a).sum();
    let s = dot / nn;

    let mut err = 0.0;
    let mut norm = 0.0;
    for (a, b) in est.iter().zip(gt.iter()) {
        err += (s * a - b) * (s * a - b);
        norm += b * b;
    }
    (err / norm).sqrt()
}

#[test]
fn exact_recovery_up_to_scale() {
    let gt = sample_homography();
    let p1 = scatter_points(12, 500.0, 31);
    let p2 = apply_homography(&gt, &p1);

    let h = fit_homography(&p1, &p2).unwrap();
    assert!(
        relative_homography_error(&h, &gt) < 1e-6,
        "recovered homography too far from ground truth"
    );

    // With noise-free correspondences every index is an inlier for any
    // positive threshold.
    let inliers = classify_inliers(&h, &p1, &p2, 1e-6);
    assert_eq!(inliers, (0..12).collect::<Vec<_>>());
}

#[test]
fn classification_is_scale_invariant() {
    let gt = sample_homography();
    let p1 = scatter_points(30, 500.0, 32);
    let mut p2 = apply_homography(&gt, &p1);
    corrupt_tail(&mut p2, 10, 500.0, 33);

    let base = classify_inliers(&gt, &p1, &p2, 2.0);
    assert!(!base.is_empty());

    for s in [3.7, -2.0, 1e-3] {
        let scaled = gt * s;
        assert_eq!(classify_inliers(&scaled, &p1, &p2, 2.0), base);
    }
}

#[test]
fn inlier_count_is_monotone_in_threshold() {
    let gt = sample_homography();
    let p1 = scatter_points(40, 500.0, 34);
    let mut p2 = apply_homography(&gt, &p1);
    corrupt_tail(&mut p2, 15, 500.0, 35);

    let mut previous = 0;
    for th in [1e-3, 0.5, 2.0, 25.0, 1e6] {
        let count = classify_inliers(&gt, &p1, &p2, th).len();
        assert!(
            count >= previous,
            "inlier count dropped from {} to {} at threshold {}",
            previous,
            count,
            th
        );
        previous = count;
    }
    assert_eq!(previous, 40);
}

#[test]
fn robust_estimation_survives_thirty_percent_outliers() -> anyhow::Result<()> {
    let gt = sample_homography();
    let p1 = scatter_points(100, 500.0, 11);
    let mut p2 = apply_homography(&gt, &p1);
    corrupt_tail(&mut p2, 30, 500.0, 12);

    let opts = RansacOptions {
        max_iters: 1000,
        thresh: 2.0,
        min_inliers: 5,
        confidence: 0.99,
        seed: 5,
    };

    let (h, inliers) = estimate_homography_ransac(&p1, &p2, &opts)?;

    assert!(
        inliers.len() >= 65,
        "expected at least 65 inliers, got {}",
        inliers.len()
    );
    // The 70 clean correspondences must all be part of the consensus.
    for i in 0..70 {
        assert!(inliers.contains(&i), "clean correspondence {} lost", i);
    }
    assert!(
        relative_homography_error(&h, &gt) < 1e-3,
        "estimate too far from ground truth: {}",
        relative_homography_error(&h, &gt)
    );
    Ok(())
}

#[test]
fn refit_is_deterministic() {
    let gt = sample_homography();
    let p1 = scatter_points(20, 500.0, 36);
    let p2 = apply_homography(&gt, &p1);

    let h1 = fit_homography(&p1, &p2).unwrap();
    let h2 = fit_homography(&p1, &p2).unwrap();
    assert_eq!(h1, h2);
}

#[test]
fn unrelated_point_sets_yield_no_consensus() {
    let p1 = scatter_points(40, 500.0, 21);
    let p2 = scatter_points(40, 500.0, 22);

    let opts = RansacOptions {
        max_iters: 300,
        thresh: 0.001,
        min_inliers: 5,
        confidence: 0.99,
        seed: 3,
    };

    let err = estimate_homography_ransac(&p1, &p2, &opts).unwrap_err();
    assert!(matches!(err, HomographyError::NoConsensus));
}

#[test]
fn seeded_estimation_is_reproducible() {
    let gt = sample_homography();
    let p1 = scatter_points(60, 500.0, 37);
    let mut p2 = apply_homography(&gt, &p1);
    corrupt_tail(&mut p2, 20, 500.0, 38);

    let opts = RansacOptions::default();

    let (ha, ia) = estimate_homography_ransac(&p1, &p2, &opts).unwrap();
    let (hb, ib) = estimate_homography_ransac(&p1, &p2, &opts).unwrap();

    assert_eq!(ia, ib);
    assert_eq!(ha, hb);
}
