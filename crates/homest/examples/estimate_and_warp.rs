//! End-to-end demo: generate noisy correspondences, estimate a homography
//! robustly, warp a synthetic image through it, and emit camera wireframes.
//!
//! Run with `cargo run --example estimate_and_warp`.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

use homest::{
    camera_wireframe, classify_inliers, estimate_homography_ransac, image_plane_outline,
    synthetic, warp_onto_frame, Mat34, RansacOptions, TraceCounter, WarpOptions,
};

fn checkerboard(w: u32, h: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgb([230, 230, 230])
        } else {
            Rgb([40, 40, 90])
        }
    })
}

fn main() -> Result<()> {
    // 80 correspondences through a known homography, 20 of them corrupted.
    let h_true = synthetic::sample_homography();
    let src = synthetic::scatter_points(80, 400.0, 11);
    let mut dst = synthetic::apply_homography(&h_true, &src);
    synthetic::corrupt_tail(&mut dst, 20, 400.0, 12);

    let opts = RansacOptions {
        thresh: 1.5,
        seed: 42,
        ..RansacOptions::default()
    };
    let (h, inliers) =
        estimate_homography_ransac(&src, &dst, &opts).context("homography estimation")?;
    println!("estimated homography with {} / 80 inliers:\n{h:.4}", inliers.len());

    let all = classify_inliers(&h, &src, &dst, opts.thresh);
    println!("re-classification finds {} inliers", all.len());

    // Warp a checkerboard through the estimate, on a canvas that also covers
    // an equally sized reference frame.
    let board = checkerboard(400, 300, 25);
    let reference = RgbImage::new(400, 300);
    let warped = warp_onto_frame(&board, &h, &reference, &WarpOptions::default())
        .context("warping checkerboard")?;
    let path = "warped_checkerboard.png";
    warped.save(path).context("saving warp output")?;
    println!("wrote {path} ({}x{})", warped.width(), warped.height());

    // Wireframes for a pair of cameras plus the image plane outline.
    let mut traces = TraceCounter::new();
    let p1 = Mat34::new(
        1.0, 0.0, 0.0, 200.0, //
        0.0, 1.0, 0.0, 150.0, //
        0.0, 0.0, 1.0, 600.0,
    );
    let p2 = Mat34::new(
        0.9, 0.1, 0.0, -120.0, //
        -0.1, 0.9, 0.0, 180.0, //
        0.0, 0.0, 1.0, 650.0,
    );
    let plane = image_plane_outline(&mut traces, 400.0, 300.0, "image plane");
    let cam1 = camera_wireframe(&mut traces, &p1, 400.0, 300.0, 200.0, "camera 1")?;
    let cam2 = camera_wireframe(&mut traces, &p2, 400.0, 300.0, 200.0, "camera 2")?;
    for trace in [&plane, &cam1, &cam2] {
        println!("trace #{} `{}`: {} vertices", trace.id, trace.name, trace.vertices.len());
    }

    Ok(())
}
