//! Deterministic synthetic correspondence generation.
//!
//! Building blocks for constructing planar estimation problems in tests and
//! examples: uniform point scatters, exact transfer through a known
//! homography, and controlled outlier injection. All generators take an
//! explicit seed so results are reproducible across runs.

use crate::{point_set_from_pixels, Mat3, PointSet, Pt2, Real};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Uniform scatter of `n` points in `[0, span) x [0, span)`, with `w = 1`.
pub fn scatter_points(n: usize, span: Real, seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let pts: Vec<Pt2> = (0..n)
        .map(|_| Pt2::new(rng.random_range(0.0..span), rng.random_range(0.0..span)))
        .collect();
    point_set_from_pixels(&pts)
}

/// Transfer every column of `points` through `h` and rescale to `w = 1`.
pub fn apply_homography(h: &Mat3, points: &PointSet) -> PointSet {
    let mut out = PointSet::zeros(points.ncols());
    for i in 0..points.ncols() {
        let q = h * points.column(i);
        out[(0, i)] = q[0] / q[2];
        out[(1, i)] = q[1] / q[2];
        out[(2, i)] = 1.0;
    }
    out
}

/// Replace the trailing `count` columns of `points` with a uniform scatter,
/// turning those correspondences into outliers.
pub fn corrupt_tail(points: &mut PointSet, count: usize, span: Real, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = points.ncols().saturating_sub(count);
    for i in start..points.ncols() {
        points[(0, i)] = rng.random_range(0.0..span);
        points[(1, i)] = rng.random_range(0.0..span);
        points[(2, i)] = 1.0;
    }
}

/// A mildly projective ground-truth homography useful as a test fixture.
pub fn sample_homography() -> Mat3 {
    Mat3::new(
        1.2, 0.05, 10.0, //
        -0.03, 0.95, -5.0, //
        1e-4, -2e-5, 1.0,
    )
}
