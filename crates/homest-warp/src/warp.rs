//! Image resampling through a planar homography.
//!
//! The warp is computed by inverse mapping: for every destination pixel the
//! inverse homography gives a source location, which is sampled with the
//! requested interpolation. Pixels mapping outside the source are filled
//! with black. Destination rows are processed in parallel.

use image::RgbImage;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use homest_core::{Mat3, Real, Vec3};

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("homography is singular and cannot be inverted")]
    SingularHomography,
    #[error("warped corners are not finite")]
    NonFiniteBounds,
    #[error("destination canvas is empty")]
    EmptyCanvas,
}

/// Pixel sampling rule for destination pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WarpOptions {
    pub interpolation: Interpolation,
}

/// Axis-aligned region of the destination plane, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub xmin: Real,
    pub xmax: Real,
    pub ymin: Real,
    pub ymax: Real,
}

impl CanvasBounds {
    /// Bounds covering exactly the pixel grid of `img`.
    pub fn of_image(img: &RgbImage) -> Self {
        Self {
            xmin: 0.0,
            xmax: (img.width().saturating_sub(1)) as Real,
            ymin: 0.0,
            ymax: (img.height().saturating_sub(1)) as Real,
        }
    }

    /// Smallest bounds containing the four corners of `img` pushed
    /// through `h`. Fails if the corners map to non-finite points.
    pub fn of_warped_image(h: &Mat3, img: &RgbImage) -> Result<Self, WarpError> {
        let w = (img.width().saturating_sub(1)) as Real;
        let ht = (img.height().saturating_sub(1)) as Real;
        let corners = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(w, 0.0, 1.0),
            Vec3::new(0.0, ht, 1.0),
            Vec3::new(w, ht, 1.0),
        ];

        let mut xmin = Real::INFINITY;
        let mut xmax = Real::NEG_INFINITY;
        let mut ymin = Real::INFINITY;
        let mut ymax = Real::NEG_INFINITY;
        for c in &corners {
            let p = h * c;
            let x = p.x / p.z;
            let y = p.y / p.z;
            if !x.is_finite() || !y.is_finite() {
                return Err(WarpError::NonFiniteBounds);
            }
            xmin = xmin.min(x);
            xmax = xmax.max(x);
            ymin = ymin.min(y);
            ymax = ymax.max(y);
        }
        Ok(Self { xmin, xmax, ymin, ymax })
    }

    /// Union of two bounds.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    fn pixel_size(&self) -> (u32, u32) {
        let w = (self.xmax - self.xmin + 1.0).ceil();
        let h = (self.ymax - self.ymin + 1.0).ceil();
        if w < 1.0 || h < 1.0 || !w.is_finite() || !h.is_finite() {
            (0, 0)
        } else {
            (w as u32, h as u32)
        }
    }
}

#[inline]
fn sample_nearest(src: &RgbImage, x: Real, y: Real) -> [u8; 3] {
    let xi = x.round();
    let yi = y.round();
    if xi < 0.0 || yi < 0.0 || xi >= src.width() as Real || yi >= src.height() as Real {
        return [0, 0, 0];
    }
    src.get_pixel(xi as u32, yi as u32).0
}

#[inline]
fn sample_bilinear(src: &RgbImage, x: Real, y: Real) -> [u8; 3] {
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;
    if x0 < 0.0 || y0 < 0.0 || x1 >= src.width() as Real || y1 >= src.height() as Real {
        // Fall back on the nearest pixel at the border so edge rows are not
        // lost, and black outside the source entirely.
        return sample_nearest(src, x, y);
    }
    let fx = x - x0;
    let fy = y - y0;
    let p00 = src.get_pixel(x0 as u32, y0 as u32).0;
    let p10 = src.get_pixel(x1 as u32, y0 as u32).0;
    let p01 = src.get_pixel(x0 as u32, y1 as u32).0;
    let p11 = src.get_pixel(x1 as u32, y1 as u32).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as Real * (1.0 - fx) + p10[c] as Real * fx;
        let bot = p01[c] as Real * (1.0 - fx) + p11[c] as Real * fx;
        out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Warp `src` by `h` onto the canvas described by `bounds`.
///
/// The output image has `ceil(xmax - xmin + 1)` by `ceil(ymax - ymin + 1)`
/// pixels; its pixel `(0, 0)` corresponds to destination coordinate
/// `(xmin, ymin)`. Every destination pixel is mapped through `h^-1` back
/// into `src` and sampled there.
pub fn warp_into_bounds(
    src: &RgbImage,
    h: &Mat3,
    bounds: &CanvasBounds,
    opts: &WarpOptions,
) -> Result<RgbImage, WarpError> {
    let h_inv = h.try_inverse().ok_or(WarpError::SingularHomography)?;
    let (width, height) = bounds.pixel_size();
    if width == 0 || height == 0 {
        return Err(WarpError::EmptyCanvas);
    }
    debug!(
        "warping {}x{} source onto {}x{} canvas",
        src.width(),
        src.height(),
        width,
        height
    );

    let interpolation = opts.interpolation;
    let mut dst = RgbImage::new(width, height);
    let buf: &mut [u8] = &mut dst;
    buf.par_chunks_mut(width as usize * 3)
        .enumerate()
        .for_each(|(row, chunk)| {
            let gy = row as Real + bounds.ymin;
            for (col, px) in chunk.chunks_exact_mut(3).enumerate() {
                let gx = col as Real + bounds.xmin;
                let p = h_inv * Vec3::new(gx, gy, 1.0);
                if p.z.abs() <= Real::EPSILON {
                    px.copy_from_slice(&[0, 0, 0]);
                    continue;
                }
                let sx = p.x / p.z;
                let sy = p.y / p.z;
                let rgb = match interpolation {
                    Interpolation::Nearest => sample_nearest(src, sx, sy),
                    Interpolation::Bilinear => sample_bilinear(src, sx, sy),
                };
                px.copy_from_slice(&rgb);
            }
        });
    Ok(dst)
}

/// Warp `src` by `h` onto a canvas that covers both the warped source
/// footprint and the frame of `reference`, so the two can be overlaid.
pub fn warp_onto_frame(
    src: &RgbImage,
    h: &Mat3,
    reference: &RgbImage,
    opts: &WarpOptions,
) -> Result<RgbImage, WarpError> {
    let bounds = CanvasBounds::of_warped_image(h, src)?.merge(&CanvasBounds::of_image(reference));
    warp_into_bounds(src, h, &bounds, opts)
}
