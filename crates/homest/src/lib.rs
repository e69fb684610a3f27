//! Facade crate: one import for the whole homography pipeline.
//!
//! - estimation: [`estimate_homography_ransac`], [`fit_homography`],
//!   [`classify_inliers`] and friends from `homest-linear`;
//! - shared math and the generic RANSAC engine from `homest-core`;
//! - image warping and camera wireframes from `homest-warp`.
//!
//! ```no_run
//! use homest::{estimate_homography_ransac, RansacOptions};
//! # use homest::PointSet;
//! # fn demo(src: &PointSet, dst: &PointSet) -> anyhow::Result<()> {
//! let (h, inliers) = estimate_homography_ransac(src, dst, &RansacOptions::default())?;
//! println!("{} inliers, H = {h}", inliers.len());
//! # Ok(())
//! # }
//! ```

pub use homest_core::{
    math::{self, Mat3, Mat34, PointSet, Pt2, Pt3, Real, Vec2, Vec3},
    ransac::{self, ransac_fit, Estimator, RansacOptions, RansacResult},
    synthetic,
};
pub use homest_linear::{
    classify_inliers, estimate_homography_ransac, fit_homography, is_usable_homography,
    normalize_points, HomographyError,
};
pub use homest_warp::{
    camera_wireframe, image_plane_outline, optical_center, view_direction, warp_into_bounds,
    warp_onto_frame, CanvasBounds, Interpolation, Polyline3, SceneError, TraceCounter, WarpError,
    WarpOptions,
};
