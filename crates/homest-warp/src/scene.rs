//! Line geometry for rendering cameras and image planes in 3D.
//!
//! A camera is drawn as a frustum-style wireframe built from its 3x4
//! projection matrix: the optical center (null space of P) joined to the
//! four back-projected corners of a square of side `2 * scale` around the
//! principal direction. Image planes are drawn as closed rectangles at
//! z = 0. The output is plain polylines; plotting itself is left to the
//! caller.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use homest_core::{Mat34, Pt3, Real, Vec3};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("projection matrix has no null space")]
    NoOpticalCenter,
    #[error("left 3x3 block of the projection matrix is singular")]
    SingularProjection,
}

/// One named 3D polyline, ready to hand to a plotting backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline3 {
    pub id: usize,
    pub name: String,
    pub vertices: Vec<[Real; 3]>,
}

/// Allocates stable ids for the polylines of one scene.
///
/// Replaces any global counter state: each scene owns its counter, so two
/// scenes built concurrently never collide.
#[derive(Debug, Default)]
pub struct TraceCounter {
    next: usize,
}

impl TraceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Optical center of a camera with projection matrix `p`, i.e. the
/// dehomogenized right null vector of `p`.
pub fn optical_center(p: &Mat34) -> Result<Pt3, SceneError> {
    // Pad to 4x4 so the thin SVD exposes the null-space row of V^T.
    let mut padded = DMatrix::<Real>::zeros(4, 4);
    padded.view_mut((0, 0), (3, 4)).copy_from(p);
    let svd = padded.svd(false, true);
    let v_t = svd.v_t.ok_or(SceneError::NoOpticalCenter)?;
    let h = v_t.row(v_t.nrows() - 1);
    if h[3].abs() <= Real::EPSILON {
        return Err(SceneError::NoOpticalCenter);
    }
    Ok(Pt3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3]))
}

/// Direction in space that projects to pixel `(x, y)`: the ray
/// `M^-1 * (x, y, 1)` where `M` is the left 3x3 block of `p`.
pub fn view_direction(p: &Mat34, x: Real, y: Real) -> Result<Vec3, SceneError> {
    let m = p.fixed_view::<3, 3>(0, 0).into_owned();
    let m_inv = m.try_inverse().ok_or(SceneError::SingularProjection)?;
    Ok(m_inv * Vec3::new(x, y, 1.0))
}

/// Wireframe of the camera `p`, drawn as one connected polyline.
///
/// `width` and `height` locate the image corners; `scale` sets how far the
/// frustum extends from the optical center.
pub fn camera_wireframe(
    counter: &mut TraceCounter,
    p: &Mat34,
    width: Real,
    height: Real,
    scale: Real,
    name: &str,
) -> Result<Polyline3, SceneError> {
    let o = optical_center(p)?;
    let corner = |x, y| -> Result<Pt3, SceneError> {
        let d = view_direction(p, x, y)?.normalize();
        Ok(o + d * scale)
    };
    let p1 = corner(0.0, 0.0)?;
    let p2 = corner(width, 0.0)?;
    let p3 = corner(width, height)?;
    let p4 = corner(0.0, height)?;
    let apex = Pt3::from((p1.coords + p2.coords) / 2.0);

    // One stroke covering all frustum edges plus a tick marking the top.
    let path = [p1, p2, o, p3, p2, p3, p4, p1, o, p4, o, apex];
    Ok(Polyline3 {
        id: counter.next_id(),
        name: name.to_owned(),
        vertices: path.iter().map(|v| [v.x, v.y, v.z]).collect(),
    })
}

/// Outline of a `width` by `height` image lying in the z = 0 plane.
pub fn image_plane_outline(
    counter: &mut TraceCounter,
    width: Real,
    height: Real,
    name: &str,
) -> Polyline3 {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [width, 0.0, 0.0],
        [width, height, 0.0],
        [0.0, height, 0.0],
        [0.0, 0.0, 0.0],
    ];
    Polyline3 { id: counter.next_id(), name: name.to_owned(), vertices }
}
