use super::*;
use crate::camera::MockCamera;
use crate::detector::{DetectionAdapter, MockDetector};
use crate::error::CaptureError;
use crate::game::RoundTicket;
use std::sync::Arc;
use std::time::Duration;

fn ticket(target: &str) -> RoundTicket {
    RoundTicket {
        round: 1,
        target: target.to_string(),
    }
}

fn throttle_with(detector: Arc<MockDetector>) -> CaptureThrottle {
    CaptureThrottle::new(DetectionAdapter::new(detector, false), 0.5)
}

#[tokio::test]
async fn test_capture_reports_detection_for_ticket() {
    let detector = Arc::new(MockDetector::new());
    detector.push_found("cup");
    let camera = MockCamera::new();
    let throttle = throttle_with(detector.clone());

    let report = throttle
        .request_capture(Some(ticket("cup")), &camera)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.ticket, ticket("cup"));
    assert!(report.analysis.result.matches_target);
    assert_eq!(report.frame_id, 1);
    assert_eq!(detector.requests()[0].target, "cup");
    assert_eq!(detector.requests()[0].confidence_threshold, 0.5);

    assert!(throttle.is_busy());
    drop(report);
    assert!(!throttle.is_busy());
}

#[tokio::test]
async fn test_no_active_round_is_a_no_op() {
    let detector = Arc::new(MockDetector::new());
    let camera = MockCamera::new();
    let throttle = throttle_with(detector.clone());

    let outcome = throttle.request_capture(None, &camera).await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(camera.snapshot_calls(), 0);
    assert_eq!(detector.calls(), 0);
    assert!(!throttle.is_busy());
}

#[tokio::test]
async fn test_missing_frame_clears_busy_without_request() {
    let detector = Arc::new(MockDetector::new());
    let camera = MockCamera::unavailable();
    let throttle = throttle_with(detector.clone());

    let err = throttle
        .request_capture(Some(ticket("cup")), &camera)
        .await
        .unwrap_err();

    assert_eq!(err, CaptureError::NoFrameAvailable);
    assert_eq!(camera.snapshot_calls(), 1);
    assert_eq!(detector.calls(), 0);
    assert!(!throttle.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_capture_while_busy_is_dropped() {
    let detector = Arc::new(MockDetector::with_latency(Duration::from_secs(5)));
    detector.push_found("cup");
    let camera = Arc::new(MockCamera::new());
    let throttle = throttle_with(detector.clone());

    let first = {
        let throttle = throttle.clone();
        let camera = Arc::clone(&camera);
        tokio::spawn(async move {
            throttle
                .request_capture(Some(ticket("cup")), camera.as_ref())
                .await
        })
    };
    tokio::task::yield_now().await;
    assert!(throttle.is_busy());

    let second = throttle
        .request_capture(Some(ticket("cup")), camera.as_ref())
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(camera.snapshot_calls(), 1);
    assert_eq!(detector.calls(), 1);

    let report = first.await.unwrap().unwrap().unwrap();
    assert!(report.analysis.result.matches_target);
    drop(report);
    assert!(!throttle.is_busy());

    let third = throttle
        .request_capture(Some(ticket("cup")), camera.as_ref())
        .await
        .unwrap();
    assert!(third.is_some());
    assert_eq!(detector.calls(), 2);
}

#[tokio::test]
async fn test_failed_detector_still_releases_throttle() {
    let detector = Arc::new(MockDetector::new());
    detector.push_error(crate::error::DetectorError::Transport {
        details: "connection refused".to_string(),
    });
    let camera = MockCamera::new();
    let throttle = throttle_with(detector);

    let pending = throttle
        .begin(Some(ticket("bottle")), &camera)
        .unwrap()
        .unwrap();
    assert_eq!(pending.ticket().target, "bottle");
    assert!(throttle.is_busy());

    let report = pending.run().await;
    assert!(!report.analysis.result.succeeded);
    assert!(report.analysis.error.is_some());

    drop(report);
    assert!(!throttle.is_busy());
}
