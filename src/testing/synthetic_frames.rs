//! Synthetic preview frames for offline testing.
//!
//! The live-view source hands the detector complete encoded still images;
//! these helpers fabricate such buffers (PNG, which the `image` crate
//! decodes losslessly so tests get exact pixel control) with patterns
//! matching what a slide stage actually produces: flat fields, gradients,
//! sharp structure, and per-frame sensor noise.

use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;

fn encode_png(img: GrayImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("in-memory PNG encoding cannot fail");
    buf.into_inner()
}

/// Solid gray frame of the given intensity.
pub fn synthetic_frame_png(width: u32, height: u32, value: u8) -> Vec<u8> {
    encode_png(GrayImage::from_pixel(width, height, Luma([value])))
}

/// Horizontal gradient, shifted by `phase` so successive frames differ.
pub fn gradient_frame_png(width: u32, height: u32, phase: u8) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _y| {
        Luma([((x * 255 / width.max(1)) as u8).wrapping_add(phase)])
    });
    encode_png(img)
}

/// Checkerboard with `check`-pixel squares; high-contrast structure.
pub fn checkerboard_frame_png(width: u32, height: u32, check: u32) -> Vec<u8> {
    let check = check.max(1);
    let img = GrayImage::from_fn(width, height, |x, y| {
        if ((x / check) + (y / check)) % 2 == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    encode_png(img)
}

/// Gradient frame with deterministic pseudo-random noise mixed in.
///
/// Same `seed` always yields the same frame; different seeds model the
/// sensor noise between consecutive frames of an unchanged scene.
pub fn noisy_frame_png(width: u32, height: u32, seed: u64, amplitude: u8) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u8
    };
    let img = GrayImage::from_fn(width, height, |x, y| {
        let base = ((x + y) * 255 / (width + height).max(1)) as u8;
        let noise = next() % amplitude.max(1);
        Luma([base.saturating_add(noise)])
    });
    encode_png(img)
}
