//! Stability detection engines
//!
//! Two variants, both drawn from the scanner's iteration history:
//! 1. [`window::WindowDetector`]: frame-count criterion: the scene is
//!    stable when the mean similarity against a rolling window of the
//!    last N thumbnails clears the threshold. Primary engine.
//! 2. [`machine::StateMachineDetector`]: wall-clock criterion: the scene
//!    is stable when it has matched a single reference frame continuously
//!    for a configured duration.
//!
//! The window variant is the default because the frame-count criterion is
//! insensitive to jitter in the live-view poll interval.

pub mod machine;
pub mod window;

pub use machine::StateMachineDetector;
pub use window::WindowDetector;

use crate::errors::AutoCaptureError;
use crate::types::{
    DEFAULT_STABILITY_DURATION_FRAMES, DEFAULT_STABILITY_DURATION_SECS,
    DEFAULT_STABILITY_THRESHOLD,
};

/// Detector tuning parameters, shared by both variants.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectorConfig {
    /// Minimum similarity score for two frames to count as the same scene.
    /// Comparisons are inclusive: a score exactly at the threshold passes.
    pub stability_threshold: f64,

    /// Window size in frames (window variant).
    pub stability_duration_frames: usize,

    /// Continuous-similarity duration in seconds (state-machine variant).
    pub stability_duration_secs: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            stability_duration_frames: DEFAULT_STABILITY_DURATION_FRAMES,
            stability_duration_secs: DEFAULT_STABILITY_DURATION_SECS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), AutoCaptureError> {
        if !(0.0..=1.0).contains(&self.stability_threshold) {
            return Err(AutoCaptureError::ConfigError(format!(
                "stability_threshold must be within 0.0..=1.0, got {}",
                self.stability_threshold
            )));
        }
        if self.stability_duration_frames == 0 {
            return Err(AutoCaptureError::ConfigError(
                "stability_duration_frames must be at least 1".to_string(),
            ));
        }
        if !self.stability_duration_secs.is_finite() || self.stability_duration_secs <= 0.0 {
            return Err(AutoCaptureError::ConfigError(format!(
                "stability_duration_secs must be positive, got {}",
                self.stability_duration_secs
            )));
        }
        Ok(())
    }
}
