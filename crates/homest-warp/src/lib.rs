//! Presentation-side collaborators of the homography core.
//!
//! - [`warp`]: resample an RGB image through a homography onto a target
//!   canvas (inverse mapping, per-channel interpolation).
//! - [`scene`]: 3D line-geometry primitives for visualizing cameras and
//!   image planes, consuming a 3x4 projection matrix.
//!
//! Neither module inspects how a homography or projection was estimated;
//! both take the matrices as opaque inputs.

pub mod scene;
pub mod warp;

pub use scene::*;
pub use warp::*;
