//! Core math primitives for `homest`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Mat3`, ...) and homogeneous
//!   point-set helpers,
//! - a generic, seedable RANSAC engine ([`ransac_fit`], [`Estimator`]),
//! - deterministic synthetic correspondence generators for tests and examples.
//!
//! Point sets are stored column-wise in homogeneous coordinates
//! (`PointSet = Matrix3xX`), so a correspondence pair is a pair of equal-width
//! point sets aligned by column index.

/// Linear algebra type aliases and homogeneous helpers.
pub mod math;
/// Generic RANSAC engine and traits.
pub mod ransac;
/// Deterministic synthetic correspondence generation.
///
/// Used by workspace tests and examples; deterministic given a seed, so it is
/// also suitable for regression testing and benchmarks.
pub mod synthetic;

pub use math::*;
pub use ransac::*;
