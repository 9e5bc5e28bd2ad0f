//! State-Machine Detector Testing
//!
//! Drives the wall-clock detector through its full cycle with a manual
//! clock, so timing transitions are exact and no test sleeps.

use slidewatch::detector::{DetectorConfig, StateMachineDetector};
use slidewatch::errors::AutoCaptureError;
use slidewatch::testing::{checkerboard_frame_png, gradient_frame_png};
use slidewatch::timing::ManualClock;
use slidewatch::types::DetectorState;
use std::sync::Arc;
use std::time::Duration;

const HOLD: Duration = Duration::from_millis(1200);

fn detector_with_clock() -> (StateMachineDetector, ManualClock) {
    let clock = ManualClock::new();
    let detector = StateMachineDetector::with_clock(
        DetectorConfig {
            stability_duration_secs: 1.2,
            ..DetectorConfig::default()
        },
        Arc::new(clock.clone()),
    );
    (detector, clock)
}

fn slide_a() -> Vec<u8> {
    gradient_frame_png(320, 240, 0)
}

fn slide_b() -> Vec<u8> {
    checkerboard_frame_png(320, 240, 16)
}

#[test]
fn test_first_frame_starts_monitoring() {
    let (detector, _clock) = detector_with_clock();
    assert_eq!(detector.state(), DetectorState::WaitingForNewImage);

    assert!(!detector.process_frame(&slide_a()));
    assert_eq!(detector.state(), DetectorState::MonitoringStability);
}

#[test]
fn test_capture_fires_after_hold_duration() {
    let (detector, clock) = detector_with_clock();
    let frame = slide_a();

    assert!(!detector.process_frame(&frame));

    // Not yet held long enough.
    clock.advance(Duration::from_millis(600));
    assert!(!detector.process_frame(&frame));
    assert_eq!(detector.state(), DetectorState::MonitoringStability);

    // Hold duration reached (inclusive comparison at the boundary).
    clock.advance(Duration::from_millis(600));
    assert!(detector.process_frame(&frame));
    assert_eq!(detector.state(), DetectorState::Stable);
}

#[test]
fn test_stable_state_does_not_refire() {
    let (detector, clock) = detector_with_clock();
    let frame = slide_a();

    detector.process_frame(&frame);
    clock.advance(HOLD);
    assert!(detector.process_frame(&frame));

    for _ in 0..10 {
        clock.advance(Duration::from_millis(100));
        assert!(!detector.process_frame(&frame));
        assert_eq!(detector.state(), DetectorState::Stable);
    }
    assert_eq!(detector.status().captures_taken, 1);
}

#[test]
fn test_scene_change_restarts_stability_timer() {
    let (detector, clock) = detector_with_clock();

    detector.process_frame(&slide_a());
    clock.advance(Duration::from_millis(900));

    // A different slide appears: the timer restarts from this frame.
    assert!(!detector.process_frame(&slide_b()));
    assert_eq!(detector.state(), DetectorState::MonitoringStability);

    clock.advance(Duration::from_millis(900));
    assert!(!detector.process_frame(&slide_b()));

    clock.advance(Duration::from_millis(300));
    assert!(detector.process_frame(&slide_b()));
}

#[test]
fn test_capture_completed_cycle() {
    let (detector, clock) = detector_with_clock();
    let first = slide_a();
    let second = slide_b();

    detector.process_frame(&first);
    clock.advance(HOLD);
    assert!(detector.process_frame(&first));

    // Caller fires the shutter, downloads the photo, then re-arms.
    detector.on_capture_completed().unwrap();
    assert_eq!(detector.state(), DetectorState::Capturing);

    // The next frame becomes the captured-image reference.
    assert!(!detector.process_frame(&first));
    assert_eq!(detector.state(), DetectorState::WaitingForNewImage);

    // Frames matching the captured image keep the detector waiting.
    assert!(!detector.process_frame(&first));
    assert_eq!(detector.state(), DetectorState::WaitingForNewImage);

    // A new slide restarts the cycle and captures again after the hold.
    assert!(!detector.process_frame(&second));
    assert_eq!(detector.state(), DetectorState::MonitoringStability);
    clock.advance(HOLD);
    assert!(detector.process_frame(&second));
    assert_eq!(detector.status().captures_taken, 2);
}

#[test]
fn test_capture_completed_without_capture_is_error() {
    let (detector, _clock) = detector_with_clock();
    assert!(matches!(
        detector.on_capture_completed(),
        Err(AutoCaptureError::CaptureNotPending(_))
    ));

    detector.process_frame(&slide_a());
    assert!(matches!(
        detector.on_capture_completed(),
        Err(AutoCaptureError::CaptureNotPending(_))
    ));
}

#[test]
fn test_undecodable_frames_keep_monitoring() {
    let (detector, clock) = detector_with_clock();

    // Garbage decodes to the empty thumbnail, which scores 0.0 against
    // everything, so each frame reads as a "new image" and the timer
    // never completes. Stuck monitoring, never a capture.
    for _ in 0..30 {
        clock.advance(Duration::from_millis(100));
        assert!(!detector.process_frame(b"corrupt"));
    }
    assert_eq!(detector.state(), DetectorState::MonitoringStability);
    assert_eq!(detector.status().captures_taken, 0);
}

#[test]
fn test_reset_forces_waiting() {
    let (detector, clock) = detector_with_clock();
    let frame = slide_a();

    detector.process_frame(&frame);
    clock.advance(HOLD);
    detector.process_frame(&frame);
    assert_eq!(detector.state(), DetectorState::Stable);

    detector.reset();
    assert_eq!(detector.state(), DetectorState::WaitingForNewImage);

    // All references cleared: the same slide can capture again.
    detector.process_frame(&frame);
    clock.advance(HOLD);
    assert!(detector.process_frame(&frame));
}

#[test]
fn test_status_reports_elapsed_monitoring_time() {
    let (detector, clock) = detector_with_clock();

    detector.process_frame(&slide_a());
    clock.advance(Duration::from_millis(500));

    let status = detector.status();
    assert_eq!(status.state, Some(DetectorState::MonitoringStability));
    let elapsed = status.stable_elapsed_secs.unwrap();
    assert!((elapsed - 0.5).abs() < 1e-9);
    assert!(status.status_text().contains("monitoring stability (0.5"));
}
