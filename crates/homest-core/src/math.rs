use nalgebra::{Matrix3, Matrix3x4, Matrix3xX, Point2, Point3, Vector2, Vector3};

pub type Real = f64;

pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Mat3 = Matrix3<Real>;
pub type Mat34 = Matrix3x4<Real>;

/// Homogeneous 2D point set, one column per point: rows (x, y, w).
///
/// Invariant: `w` is nonzero (typically 1) for every column. Two sets forming
/// a correspondence pair must have equal width and are aligned by column.
pub type PointSet = Matrix3xX<Real>;

pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vector3::new(p.x, p.y, 1.0)
}

pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Point2::new(v.x / v.z, v.y / v.z)
}

/// Pack pixel points into a homogeneous point set with `w = 1`.
pub fn point_set_from_pixels(points: &[Pt2]) -> PointSet {
    PointSet::from_fn(points.len(), |r, c| match r {
        0 => points[c].x,
        1 => points[c].y,
        _ => 1.0,
    })
}

/// Column `i` of a point set, dehomogenized to the Euclidean plane.
pub fn column_point(points: &PointSet, i: usize) -> Pt2 {
    let col = points.column(i);
    Point2::new(col[0] / col[2], col[1] / col[2])
}

/// Gather the given columns of a point set into a new (narrower) set.
pub fn select_columns(points: &PointSet, indices: &[usize]) -> PointSet {
    PointSet::from_fn(indices.len(), |r, c| points[(r, indices[c])])
}
