//! Live-view polling worker.
//!
//! One dedicated thread pulls the latest preview frame from the camera at
//! a fixed interval and feeds it synchronously into the detector; when the
//! detector says "capture now" the worker fires the shutter through a
//! [`CaptureTrigger`]. A depth-one [`CaptureSlot`] tracks the outstanding
//! physical capture so a second trigger cannot be issued while one is in
//! flight.

use crate::detector::WindowDetector;
use crate::errors::AutoCaptureError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Supplies the most recent live-view frame as encoded image bytes.
///
/// Implemented over the vendor SDK's preview poll. `Ok(None)` means no new
/// frame is available this tick, which is normal.
pub trait LiveViewSource: Send {
    fn latest_frame(&mut self) -> Result<Option<Vec<u8>>, AutoCaptureError>;
}

/// Fires the physical shutter. Implemented over the vendor SDK.
pub trait CaptureTrigger: Send {
    fn trigger_capture(&mut self) -> Result<(), AutoCaptureError>;
}

/// Depth-one pending-capture queue.
///
/// The capture pipeline owns exactly one in-flight request at a time;
/// requesting a second while one is outstanding is a sequencing bug and
/// surfaces as a hard error rather than being silently dropped.
#[derive(Default)]
pub struct CaptureSlot {
    pending: Mutex<bool>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a new capture request.
    pub fn request(&self) -> Result<(), AutoCaptureError> {
        let mut pending = self.pending.lock().expect("lock poisoned");
        if *pending {
            return Err(AutoCaptureError::capture_in_flight());
        }
        *pending = true;
        Ok(())
    }

    /// Release the slot once the capture is confirmed downloaded.
    pub fn complete(&self) -> Result<(), AutoCaptureError> {
        let mut pending = self.pending.lock().expect("lock poisoned");
        if !*pending {
            return Err(AutoCaptureError::capture_not_pending());
        }
        *pending = false;
        Ok(())
    }

    /// Unconditionally release the slot, e.g. when auto-capture is
    /// disabled mid-cycle.
    pub fn clear(&self) {
        *self.pending.lock().expect("lock poisoned") = false;
    }

    pub fn is_pending(&self) -> bool {
        *self.pending.lock().expect("lock poisoned")
    }
}

/// Worker tuning parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkerConfig {
    /// Interval between live-view polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), AutoCaptureError> {
        if self.poll_interval_ms == 0 {
            return Err(AutoCaptureError::ConfigError(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owns the polling thread and routes capture decisions to the trigger.
pub struct AutoCaptureWorker {
    detector: Arc<WindowDetector>,
    slot: Arc<CaptureSlot>,
    enabled: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    config: WorkerConfig,
}

impl AutoCaptureWorker {
    pub fn new(detector: Arc<WindowDetector>, config: WorkerConfig) -> Self {
        Self {
            detector,
            slot: Arc::new(CaptureSlot::new()),
            enabled: Arc::new(AtomicBool::new(true)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
            config,
        }
    }

    /// Spawn the polling thread over the given source and trigger.
    pub fn start(
        &self,
        source: Box<dyn LiveViewSource>,
        trigger: Box<dyn CaptureTrigger>,
    ) -> Result<(), AutoCaptureError> {
        self.config.validate()?;

        let mut thread = self.thread.lock().expect("lock poisoned");
        if thread.is_some() {
            return Err(AutoCaptureError::WorkerError(
                "worker is already started".to_string(),
            ));
        }

        self.stop_flag.store(false, Ordering::Relaxed);

        let detector = self.detector.clone();
        let slot = self.slot.clone();
        let enabled = self.enabled.clone();
        let stop_flag = self.stop_flag.clone();
        let poll_interval = self.config.poll_interval();

        let handle = std::thread::Builder::new()
            .name("slidewatch-capture".to_string())
            .spawn(move || {
                poll_loop(detector, slot, enabled, stop_flag, poll_interval, source, trigger)
            })
            .map_err(|e| AutoCaptureError::WorkerError(format!("spawn failed: {}", e)))?;

        *thread = Some(handle);
        log::info!(
            "Auto-capture worker started (poll interval {} ms)",
            self.config.poll_interval_ms
        );
        Ok(())
    }

    /// Stop the polling thread, waiting up to `join_timeout` for it to
    /// finish. Any pending capture request is released.
    pub fn stop(&self, join_timeout: Duration) -> Result<(), AutoCaptureError> {
        self.stop_flag.store(true, Ordering::Relaxed);

        let join_handle = self.thread.lock().expect("lock poisoned").take();
        if let Some(handle) = join_handle {
            let start = Instant::now();
            let mut handle = Some(handle);
            loop {
                let finished = handle.as_ref().is_some_and(|h| h.is_finished());
                if finished {
                    let _ = handle.take().map(|h| h.join());
                    break;
                }
                if start.elapsed() >= join_timeout {
                    // Best-effort: keep the handle so a later stop can retry.
                    *self.thread.lock().expect("lock poisoned") = handle.take();
                    return Err(AutoCaptureError::WorkerError(
                        "timed out waiting for polling thread".to_string(),
                    ));
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        self.slot.clear();
        log::info!("Auto-capture worker stopped");
        Ok(())
    }

    /// Toggle auto-capture without tearing down the thread.
    ///
    /// Disabling clears any pending capture request so re-enabling starts
    /// from a clean slate.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.slot.clear();
        }
        log::debug!("Auto-capture {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Report that the physical capture has been confirmed downloaded.
    ///
    /// Errors if no capture is outstanding: that is a sequencing bug in
    /// the caller's download pipeline.
    pub fn capture_completed(&self) -> Result<(), AutoCaptureError> {
        self.slot.complete()
    }

    pub fn pending_capture(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn detector(&self) -> &Arc<WindowDetector> {
        &self.detector
    }
}

#[allow(clippy::too_many_arguments)]
fn poll_loop(
    detector: Arc<WindowDetector>,
    slot: Arc<CaptureSlot>,
    enabled: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    poll_interval: Duration,
    mut source: Box<dyn LiveViewSource>,
    mut trigger: Box<dyn CaptureTrigger>,
) {
    while !stop_flag.load(Ordering::Relaxed) {
        if enabled.load(Ordering::Relaxed) {
            match source.latest_frame() {
                Ok(Some(frame)) => {
                    if detector.process_frame(&frame) && !slot.is_pending() {
                        fire_capture(&slot, trigger.as_mut());
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Live view poll failed: {}", e),
            }
        }
        std::thread::sleep(poll_interval);
    }
}

fn fire_capture(slot: &CaptureSlot, trigger: &mut dyn CaptureTrigger) {
    if let Err(e) = slot.request() {
        // Double-fire means the completion handshake was skipped; surface
        // loudly but keep polling.
        log::error!("Capture decision while one is in flight: {}", e);
        return;
    }
    match trigger.trigger_capture() {
        Ok(()) => log::info!("Physical capture triggered"),
        Err(e) => {
            log::warn!("Capture trigger failed: {}", e);
            slot.clear();
        }
    }
}
