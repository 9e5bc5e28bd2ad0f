//! Testing utilities for slidewatch
//!
//! Provides synthetic encoded preview frames so the detector can be
//! exercised offline, without a tethered camera.

pub mod synthetic_frames;

pub use synthetic_frames::{
    checkerboard_frame_png, gradient_frame_png, noisy_frame_png, synthetic_frame_png,
};

/// Initialize env_logger for a test binary. Safe to call repeatedly;
/// later calls are no-ops.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
