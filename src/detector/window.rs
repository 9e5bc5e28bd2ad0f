//! Sliding-window stability detector.
//!
//! Holds the thumbnails of the last `stability_duration_frames` preview
//! frames and declares the scene stable when the incoming frame's mean
//! similarity against the whole window clears the threshold. A capture
//! fires only once the window is full, so a freshly placed slide cannot
//! trigger before enough history has accumulated, and the thumbnail of
//! the captured frame suppresses re-captures until the scene changes.

use crate::detector::DetectorConfig;
use crate::history::{HistoryEvent, StabilityHistory};
use crate::similarity::{reduce_frame, thumbnail_similarity};
use crate::types::{DetectorStatus, SimilarityScore, Thumbnail};
use crossbeam_channel::Receiver;
use std::collections::VecDeque;
use std::sync::Mutex;

struct Inner {
    config: DetectorConfig,
    window: VecDeque<Thumbnail>,
    last_captured: Option<Thumbnail>,
    frames_processed: u64,
    captures_taken: u64,
    stable: bool,
    history: StabilityHistory,
}

/// Frame-count stability detector (primary engine).
///
/// Thread-safe: all state sits behind one mutex, so a polling thread can
/// call [`process_frame`](Self::process_frame) while a UI thread reads
/// [`status`](Self::status) and the history. Frames must still arrive in
/// order from a single producer.
pub struct WindowDetector {
    inner: Mutex<Inner>,
}

impl WindowDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let history = StabilityHistory::new(config.stability_duration_frames);
        Self {
            inner: Mutex::new(Inner {
                config,
                window: VecDeque::new(),
                last_captured: None,
                frames_processed: 0,
                captures_taken: 0,
                stable: false,
                history,
            }),
        }
    }

    /// Process one live-view frame; returns `true` exactly when the
    /// physical shutter should fire.
    ///
    /// The decision sequence:
    /// 1. If the previous capture's thumbnail is still on file, an
    ///    incoming frame at or above the threshold is the same slide and
    ///    is suppressed; below it the scene has moved on, so the window
    ///    restarts from this frame.
    /// 2. Otherwise the frame is scored against every window entry, the
    ///    vector is recorded for diagnostics, and stability is the mean
    ///    score (inclusive threshold).
    /// 3. A capture triggers only when stable *and* the window just
    ///    reached full capacity.
    pub fn process_frame(&self, frame_data: &[u8]) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let thumb = reduce_frame(frame_data);
        inner.frames_processed += 1;

        if let Some(last) = inner.last_captured.clone() {
            let score = thumbnail_similarity(&thumb, &last);
            if score >= inner.config.stability_threshold {
                // Still looking at the slide we just captured.
                inner.push_bounded(thumb);
                return false;
            }
            // New slide on the stage: forget the old capture and start
            // the window over from this frame.
            log::debug!(
                "Scene changed after capture (similarity {:.3}), restarting window",
                score
            );
            inner.last_captured = None;
            inner.window.clear();
            inner.window.push_back(thumb);
            inner.stable = false;
            return false;
        }

        let similarities: Vec<SimilarityScore> = inner
            .window
            .iter()
            .map(|prior| thumbnail_similarity(&thumb, prior))
            .collect();
        inner.history.record(&similarities);

        // An empty window has no evidence of stability.
        inner.stable = if similarities.is_empty() {
            false
        } else {
            let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
            mean >= inner.config.stability_threshold
        };

        inner.push_bounded(thumb.clone());

        if inner.stable && inner.window.len() == inner.config.stability_duration_frames {
            inner.last_captured = Some(thumb);
            inner.captures_taken += 1;
            log::info!(
                "Scene stable over {} frames, triggering capture #{}",
                inner.config.stability_duration_frames,
                inner.captures_taken
            );
            return true;
        }
        false
    }

    /// Clear the window, history, and capture suppression state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.window.clear();
        inner.last_captured = None;
        inner.stable = false;
        inner.history.clear();
        log::debug!("Window detector reset");
    }

    /// Snapshot for UI polling.
    pub fn status(&self) -> DetectorStatus {
        let inner = self.inner.lock().expect("lock poisoned");
        DetectorStatus {
            state: None,
            stable: inner.stable,
            frames_processed: inner.frames_processed,
            captures_taken: inner.captures_taken,
            stable_elapsed_secs: None,
        }
    }

    /// Human-readable status line.
    pub fn status_text(&self) -> String {
        self.status().status_text()
    }

    /// Retained similarity vectors, oldest first, uniform width.
    pub fn history_snapshot(&self) -> Vec<Vec<SimilarityScore>> {
        self.inner.lock().expect("lock poisoned").history.snapshot()
    }

    /// Subscribe to history updates for incremental chart redraws.
    pub fn subscribe_history(&self) -> Receiver<HistoryEvent> {
        self.inner.lock().expect("lock poisoned").history.subscribe()
    }

    /// Current number of retained prior frames (at most the window size).
    pub fn window_len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").window.len()
    }

    pub fn config(&self) -> DetectorConfig {
        self.inner.lock().expect("lock poisoned").config.clone()
    }
}

impl Inner {
    fn push_bounded(&mut self, thumb: Thumbnail) {
        self.window.push_back(thumb);
        while self.window.len() > self.config.stability_duration_frames {
            self.window.pop_front();
        }
    }
}

impl Default for WindowDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
