//! Linear solvers for planar homography estimation.
//!
//! The homography `H` maps homogeneous points of the first set to the second:
//! `x' ~ H x`. Estimation follows the normalized Direct Linear Transform
//! (Hartley conditioning, SVD null-space extraction, de-normalization) with a
//! robust RANSAC wrapper on top that classifies inliers by pixel reprojection
//! error and rejects ill-conditioned candidates via their condition number.

/// Hartley normalization and SVD extraction helpers.
pub mod math;
mod homography;

pub use homography::*;
