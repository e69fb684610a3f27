//! Mathematical utilities shared by the homography solvers.
//!
//! - **Hartley normalization** of homogeneous point sets (numerical
//!   conditioning before DLT),
//! - **SVD matrix extraction** for recovering a 3x3 matrix from the
//!   null-space row of a design matrix,
//! - **condition number** of a 3x3 matrix from its singular values.
//!
//! Normalizing points before DLT-style algorithms improves numerical
//! stability by centering the data and scaling to a canonical spread; the
//! solver de-normalizes its result afterwards.

use homest_core::{column_point, Mat3, PointSet, Real};
use nalgebra::DMatrix;

/// Hartley normalization for a homogeneous 2D point set.
///
/// Computes the similarity transform `T` (isotropic scale + translation, no
/// rotation) such that `T * points` is centered at the origin with mean
/// distance `√2` from it, and returns the transformed set together with `T`.
///
/// Returns `None` if the set is empty or all points coincide (zero mean
/// distance), in which case the scale term is undefined. Columns are
/// dehomogenized for the centroid/spread computation, so `w` must be nonzero.
pub fn hartley_normalize(points: &PointSet) -> Option<(PointSet, Mat3)> {
    let n = points.ncols();
    if n == 0 {
        return None;
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = column_point(points, i);
        cx += p.x;
        cy += p.y;
    }
    cx /= n as Real;
    cy /= n as Real;

    let mut mean_dist = 0.0;
    for i in 0..n {
        let p = column_point(points, i);
        let dx = p.x - cx;
        let dy = p.y - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n as Real;

    if mean_dist <= Real::EPSILON {
        return None;
    }

    let scale = (2.0_f64).sqrt() / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );

    Some((t * points, t))
}

/// Extract a 3x3 matrix from a row of SVD's `V^T`.
///
/// Reshapes a 9-element row (typically the last row, associated with the
/// smallest singular value) into a 3x3 matrix filled row-by-row.
///
/// # Panics
///
/// Panics if `v_t` does not have exactly 9 columns or `row_idx` is out of
/// bounds.
pub fn mat3_from_svd_row(v_t: &DMatrix<Real>, row_idx: usize) -> Mat3 {
    assert_eq!(
        v_t.ncols(),
        9,
        "Expected 9 columns for 3x3 matrix extraction"
    );
    let mut m = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            m[(r, c)] = v_t[(row_idx, 3 * r + c)];
        }
    }
    m
}

/// Ratio of the largest to smallest singular value of a 3x3 matrix.
///
/// Returns infinity when the smallest singular value vanishes (singular
/// matrix). Large values indicate numerical instability.
pub fn condition_number(m: &Mat3) -> Real {
    let svd = m.svd(false, false);
    let s = svd.singular_values;
    let s_max = s[0];
    let s_min = s[2];
    if s_min <= 0.0 {
        return Real::INFINITY;
    }
    s_max / s_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use homest_core::{point_set_from_pixels, Pt2};

    #[test]
    fn normalize_centers_and_scales() {
        let points = point_set_from_pixels(&[
            Pt2::new(100.0, 200.0),
            Pt2::new(200.0, 300.0),
            Pt2::new(150.0, 250.0),
        ]);

        let (norm, _t) = hartley_normalize(&points).unwrap();

        let n = norm.ncols() as f64;
        let cx: f64 = (0..norm.ncols()).map(|i| column_point(&norm, i).x).sum::<f64>() / n;
        let cy: f64 = (0..norm.ncols()).map(|i| column_point(&norm, i).y).sum::<f64>() / n;
        assert!(cx.abs() < 1e-10, "centroid x not at origin: {}", cx);
        assert!(cy.abs() < 1e-10, "centroid y not at origin: {}", cy);

        let mean_dist: f64 = (0..norm.ncols())
            .map(|i| column_point(&norm, i).coords.norm())
            .sum::<f64>()
            / n;
        assert!(
            (mean_dist - 2.0_f64.sqrt()).abs() < 1e-10,
            "mean distance not sqrt(2): {}",
            mean_dist
        );
    }

    #[test]
    fn normalize_transform_matches_points() {
        let points = point_set_from_pixels(&[
            Pt2::new(3.0, -1.0),
            Pt2::new(7.5, 2.0),
            Pt2::new(-4.0, 0.5),
            Pt2::new(1.0, 9.0),
        ]);

        let (norm, t) = hartley_normalize(&points).unwrap();
        let reapplied = t * &points;
        assert!((norm - reapplied).norm() < 1e-12);
    }

    #[test]
    fn normalize_rejects_coincident_points() {
        let points = point_set_from_pixels(&[
            Pt2::new(5.0, 5.0),
            Pt2::new(5.0, 5.0),
            Pt2::new(5.0, 5.0),
        ]);
        assert!(hartley_normalize(&points).is_none());

        let empty = PointSet::zeros(0);
        assert!(hartley_normalize(&empty).is_none());
    }

    #[test]
    fn svd_extraction_3x3() {
        let mut v_t = DMatrix::zeros(9, 9);
        for i in 0..9 {
            v_t[(8, i)] = (i + 1) as f64;
        }

        let m = mat3_from_svd_row(&v_t, 8);

        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(2, 2)], 9.0);
    }

    #[test]
    fn condition_number_of_identity_is_one() {
        let c = condition_number(&Mat3::identity());
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn condition_number_of_singular_matrix_is_infinite() {
        let m = Mat3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        assert!(condition_number(&m).is_infinite());
    }
}
