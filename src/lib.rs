//! Slidewatch: auto-capture stability detection for tethered slide scanning
//!
//! This crate is the decision engine behind a slide scanner's unattended
//! capture mode: it watches the camera's live-preview stream and decides
//! when the operator has placed a new slide and stopped touching the
//! stage, at which point the physical shutter should fire.
//!
//! # Features
//! - Correlation-based frame similarity (Hanning-windowed Pearson)
//! - Sliding-window and wall-clock stability detectors
//! - Duplicate-capture suppression against the last captured image
//! - Bounded similarity history with channel-based update events
//! - Dedicated polling worker with a depth-one capture hand-off
//!
//! # Usage
//! ```rust
//! use slidewatch::{DetectorConfig, WindowDetector};
//!
//! let detector = WindowDetector::new(DetectorConfig::default());
//! let frame = slidewatch::testing::synthetic_frame_png(640, 480, 128);
//! if detector.process_frame(&frame) {
//!     // fire the physical shutter, then keep feeding frames
//! }
//! ```
//!
//! The camera SDK, GUI, and metadata layers are external collaborators:
//! they supply encoded frame bytes and consume the boolean capture
//! decision.
pub mod config;
pub mod detector;
pub mod errors;
pub mod history;
pub mod similarity;
pub mod timing;
pub mod types;
pub mod worker;

// Testing utilities - synthetic frames for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::SlidewatchConfig;
pub use detector::{DetectorConfig, StateMachineDetector, WindowDetector};
pub use errors::AutoCaptureError;
pub use history::{HistoryEvent, StabilityHistory};
pub use similarity::{frame_similarity, reduce_frame, thumbnail_similarity};
pub use types::{DetectorState, DetectorStatus, SimilarityScore, Thumbnail};
pub use worker::{AutoCaptureWorker, CaptureSlot, CaptureTrigger, LiveViewSource, WorkerConfig};
