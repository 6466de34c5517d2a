use super::client::DetectionClient;
use super::types::{ClassCatalogue, Detection, DetectionResponse, HealthReport, ModelInfo};
use crate::error::DetectorError;
use crate::frame::FrameData;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// A request observed by the mock detector
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub frame_id: u64,
    pub target: String,
    pub confidence_threshold: f64,
}

/// Scripted detector for testing without a detection backend.
///
/// Replies are consumed in order; once the script is empty every request gets an
/// empty successful response.
pub struct MockDetector {
    script: Mutex<VecDeque<Result<DetectionResponse, DetectorError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicU64,
    latency: Duration,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Each request stays in flight for `latency` before replying
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            latency,
        }
    }

    /// Queue a response that reports `label`
    pub fn push_found(&self, label: &str) {
        self.push_response(DetectionResponse::with_detections(vec![Detection {
            label: label.to_string(),
            confidence: 0.87,
        }]));
    }

    /// Queue a successful response with no detections
    pub fn push_empty(&self) {
        self.push_response(DetectionResponse::with_detections(Vec::new()));
    }

    pub fn push_response(&self, response: DetectionResponse) {
        self.script.lock().push_back(Ok(response));
    }

    pub fn push_error(&self, error: DetectorError) {
        self.script.lock().push_back(Err(error));
    }

    /// Number of detect calls made
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DetectionClient for MockDetector {
    async fn detect(
        &self,
        frame: &FrameData,
        target: &str,
        confidence_threshold: f64,
    ) -> Result<DetectionResponse, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(RecordedRequest {
            frame_id: frame.id,
            target: target.to_string(),
            confidence_threshold,
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DetectionResponse::with_detections(Vec::new())));
        debug!("Mock detector replying for '{}': {:?}", target, reply);
        reply
    }

    async fn health(&self) -> Result<HealthReport, DetectorError> {
        Ok(HealthReport {
            status: "healthy".to_string(),
            model_loaded: true,
            model_info: Some(ModelInfo {
                version: "mock".to_string(),
                classes: 0,
            }),
        })
    }

    async fn classes(&self) -> Result<ClassCatalogue, DetectorError> {
        Ok(ClassCatalogue::default())
    }
}
