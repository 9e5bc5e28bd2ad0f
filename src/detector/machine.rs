//! Wall-clock stability state machine.
//!
//! Alternate detector: instead of a frame-count window it tracks one
//! reference thumbnail and requires the scene to match it continuously
//! for `stability_duration_secs`. The cycle is
//! `WaitingForNewImage -> MonitoringStability -> Stable -> Capturing ->
//! WaitingForNewImage`; the caller drives the `Capturing` leg by calling
//! [`on_capture_completed`](StateMachineDetector::on_capture_completed)
//! once the photo is confirmed downloaded.

use crate::detector::DetectorConfig;
use crate::errors::AutoCaptureError;
use crate::similarity::{reduce_frame, thumbnail_similarity};
use crate::timing::{Clock, SystemClock};
use crate::types::{DetectorState, DetectorStatus, Thumbnail};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Inner {
    config: DetectorConfig,
    state: DetectorState,
    /// Thumbnail of the most recently captured image.
    last_image: Option<Thumbnail>,
    /// Reference thumbnail the current scene is compared against.
    current_image: Option<Thumbnail>,
    stable_start: Option<Instant>,
    frames_processed: u64,
    captures_taken: u64,
}

/// Duration-based stability detector.
///
/// One mutex guards all state: a dedicated capture thread may call
/// [`process_frame`](Self::process_frame) while a UI thread polls
/// [`status`](Self::status) or reports capture completion.
pub struct StateMachineDetector {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl StateMachineDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Construct with an explicit clock, e.g. a manual clock in tests.
    pub fn with_clock(config: DetectorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                state: DetectorState::WaitingForNewImage,
                last_image: None,
                current_image: None,
                stable_start: None,
                frames_processed: 0,
                captures_taken: 0,
            }),
            clock,
        }
    }

    /// Process one live-view frame; returns `true` exactly when the
    /// physical shutter should fire.
    pub fn process_frame(&self, frame_data: &[u8]) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let thumb = reduce_frame(frame_data);
        let now = self.clock.now();
        inner.frames_processed += 1;

        match inner.state {
            DetectorState::WaitingForNewImage => {
                let score = inner
                    .last_image
                    .as_ref()
                    .map(|last| thumbnail_similarity(&thumb, last))
                    .unwrap_or(0.0);
                if score < inner.config.stability_threshold {
                    log::debug!(
                        "New image detected (similarity {:.3}), monitoring stability",
                        score
                    );
                    inner.begin_monitoring(thumb, now);
                }
                false
            }
            DetectorState::MonitoringStability => {
                let score = inner
                    .current_image
                    .as_ref()
                    .map(|current| thumbnail_similarity(&thumb, current))
                    .unwrap_or(0.0);
                if score >= inner.config.stability_threshold {
                    let held = inner
                        .stable_start
                        .map(|start| now.duration_since(start))
                        .unwrap_or(Duration::ZERO);
                    if held.as_secs_f64() >= inner.config.stability_duration_secs {
                        inner.state = DetectorState::Stable;
                        inner.captures_taken += 1;
                        log::info!(
                            "Scene stable for {:.1}s, triggering capture #{}",
                            held.as_secs_f64(),
                            inner.captures_taken
                        );
                        return true;
                    }
                    false
                } else {
                    // The stage moved again; restart the stability timer
                    // from this frame.
                    inner.begin_monitoring(thumb, now);
                    false
                }
            }
            DetectorState::Stable => {
                let score = inner
                    .current_image
                    .as_ref()
                    .map(|current| thumbnail_similarity(&thumb, current))
                    .unwrap_or(0.0);
                if score < inner.config.stability_threshold {
                    log::debug!("Scene changed while stable, monitoring new image");
                    inner.begin_monitoring(thumb, now);
                }
                false
            }
            DetectorState::Capturing => {
                // First frame after a confirmed capture becomes the
                // suppression reference.
                inner.last_image = Some(thumb);
                inner.current_image = None;
                inner.stable_start = None;
                inner.state = DetectorState::WaitingForNewImage;
                false
            }
        }
    }

    /// Report that the physical capture signalled earlier has completed.
    ///
    /// Re-arms the detector; the next processed frame is recorded as the
    /// captured image. Calling this without a signalled capture is a
    /// sequencing bug in the capture pipeline and returns a hard error.
    pub fn on_capture_completed(&self) -> Result<(), AutoCaptureError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.state != DetectorState::Stable {
            return Err(AutoCaptureError::capture_not_pending());
        }
        inner.state = DetectorState::Capturing;
        log::debug!("Capture completed, awaiting next frame");
        Ok(())
    }

    /// Force the detector back to `WaitingForNewImage`, dropping all
    /// retained images and timestamps.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.state = DetectorState::WaitingForNewImage;
        inner.last_image = None;
        inner.current_image = None;
        inner.stable_start = None;
        log::debug!("State machine detector reset");
    }

    /// Snapshot for UI polling.
    pub fn status(&self) -> DetectorStatus {
        let inner = self.inner.lock().expect("lock poisoned");
        let elapsed = match inner.state {
            DetectorState::MonitoringStability => inner
                .stable_start
                .map(|start| self.clock.now().duration_since(start).as_secs_f64()),
            _ => None,
        };
        DetectorStatus {
            state: Some(inner.state),
            stable: inner.state == DetectorState::Stable,
            frames_processed: inner.frames_processed,
            captures_taken: inner.captures_taken,
            stable_elapsed_secs: elapsed,
        }
    }

    /// Human-readable status line.
    pub fn status_text(&self) -> String {
        self.status().status_text()
    }

    pub fn state(&self) -> DetectorState {
        self.inner.lock().expect("lock poisoned").state
    }

    pub fn config(&self) -> DetectorConfig {
        self.inner.lock().expect("lock poisoned").config.clone()
    }
}

impl Inner {
    fn begin_monitoring(&mut self, thumb: Thumbnail, now: Instant) {
        self.current_image = Some(thumb);
        self.stable_start = Some(now);
        self.state = DetectorState::MonitoringStability;
    }
}

impl Default for StateMachineDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
