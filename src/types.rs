//! Core value types for the stability engine.

/// Side length of the square comparison grid every frame is reduced to.
pub const THUMBNAIL_SIZE: u32 = 64;

/// Default correlation threshold for considering two frames the same scene.
pub const DEFAULT_STABILITY_THRESHOLD: f64 = 0.95;

/// Default number of consecutive frames the window detector requires.
pub const DEFAULT_STABILITY_DURATION_FRAMES: usize = 12;

/// Default continuous-similarity duration for the state-machine detector.
///
/// Matches the window default at the 100 ms live-view poll interval.
pub const DEFAULT_STABILITY_DURATION_SECS: f64 = 1.2;

/// Maximum number of similarity vectors retained for diagnostics.
pub const HISTORY_CAP: usize = 50;

/// Similarity between two frames: 0.0 (dissimilar or undecodable) to 1.0
/// (identical). Never negative.
pub type SimilarityScore = f64;

/// Downsampled grayscale representation of a live-view frame.
///
/// All comparisons run on these rather than on raw frame bytes, which
/// bounds both CPU cost and the memory held by history buffers. An empty
/// thumbnail (zero pixels) stands for a frame that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Thumbnail {
    /// Wrap an already-reduced grayscale grid.
    ///
    /// Callers normally go through [`crate::similarity::reduce_frame`];
    /// this constructor exists for synthetic test data.
    pub fn from_pixels(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            pixels,
            width,
            height,
        }
    }

    /// The empty thumbnail, representing a decode failure.
    pub fn empty() -> Self {
        Self {
            pixels: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Lifecycle states of the state-machine detector variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectorState {
    /// Waiting for a frame that differs from the last captured image.
    WaitingForNewImage,
    /// A new image is on the stage; watching it settle.
    MonitoringStability,
    /// The scene has held still long enough; capture was signalled.
    Stable,
    /// The caller confirmed a physical capture; awaiting the next frame.
    Capturing,
}

/// Read-only snapshot of detector progress for UI polling.
///
/// Safe to request from a refresh timer on another thread; producing one
/// takes the detector lock briefly and copies plain values out.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DetectorStatus {
    /// State-machine state, or `None` for the window variant.
    pub state: Option<DetectorState>,
    /// Whether the most recent frame was judged stable (window variant).
    pub stable: bool,
    pub frames_processed: u64,
    pub captures_taken: u64,
    /// Seconds the current image has held still, when mid-monitoring.
    pub stable_elapsed_secs: Option<f64>,
}

impl DetectorStatus {
    /// Human-readable one-line summary, suitable for a status label.
    pub fn status_text(&self) -> String {
        let phase = match (self.state, self.stable) {
            (Some(DetectorState::WaitingForNewImage), _) => "waiting for new image".to_string(),
            (Some(DetectorState::MonitoringStability), _) => match self.stable_elapsed_secs {
                Some(secs) => format!("monitoring stability ({:.1}s)", secs),
                None => "monitoring stability".to_string(),
            },
            (Some(DetectorState::Stable), _) => "stable".to_string(),
            (Some(DetectorState::Capturing), _) => "capturing".to_string(),
            (None, true) => "stable".to_string(),
            (None, false) => "monitoring stability".to_string(),
        };
        format!(
            "{} | frames: {} | captures: {}",
            phase, self.frames_processed, self.captures_taken
        )
    }
}
