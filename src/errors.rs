use std::fmt;

/// Errors surfaced by the auto-capture engine.
///
/// Image-processing failures are deliberately absent: an undecodable frame
/// degrades to a zero similarity score inside the metric and never reaches
/// the caller. The variants here are configuration problems and sequencing
/// bugs in the capture pipeline, which must not be swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoCaptureError {
    ConfigError(String),
    CaptureInFlight(String),
    CaptureNotPending(String),
    SourceError(String),
    TriggerError(String),
    WorkerError(String),
}

impl AutoCaptureError {
    pub fn capture_in_flight() -> Self {
        AutoCaptureError::CaptureInFlight("a capture request is already pending".to_string())
    }

    pub fn capture_not_pending() -> Self {
        AutoCaptureError::CaptureNotPending(
            "capture completion reported with no capture outstanding".to_string(),
        )
    }
}

impl fmt::Display for AutoCaptureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AutoCaptureError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AutoCaptureError::CaptureInFlight(msg) => write!(f, "Capture in flight: {}", msg),
            AutoCaptureError::CaptureNotPending(msg) => {
                write!(f, "Capture not pending: {}", msg)
            }
            AutoCaptureError::SourceError(msg) => write!(f, "Live view source error: {}", msg),
            AutoCaptureError::TriggerError(msg) => write!(f, "Capture trigger error: {}", msg),
            AutoCaptureError::WorkerError(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for AutoCaptureError {}
