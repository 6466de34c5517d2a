use super::types::{ClassCatalogue, DetectionResponse, DetectionResult, HealthReport};
use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::frame::FrameData;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transport to an object detection backend
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Submit one frame for analysis
    async fn detect(
        &self,
        frame: &FrameData,
        target: &str,
        confidence_threshold: f64,
    ) -> Result<DetectionResponse, DetectorError>;

    /// Probe backend liveness
    async fn health(&self) -> Result<HealthReport, DetectorError>;

    /// List the labels the backend model can detect
    async fn classes(&self) -> Result<ClassCatalogue, DetectorError>;
}

/// HTTP client for the detection service
pub struct HttpDetectionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetectionClient {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        info!("Detection client targeting {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn detect(
        &self,
        frame: &FrameData,
        target: &str,
        confidence_threshold: f64,
    ) -> Result<DetectionResponse, DetectorError> {
        let threshold = confidence_threshold.to_string();

        let file = Part::bytes(frame.data.as_ref().clone())
            .file_name(frame.format.file_name())
            .mime_str(frame.format.mime_type())?;

        let form = Form::new()
            .part("file", file)
            .text("confidence_threshold", threshold.clone())
            .text("target_class", target.to_string());

        debug!(
            "Sending frame {} ({} bytes) to detector, looking for '{}'",
            frame.id,
            frame.len(),
            target
        );

        let response = self
            .client
            .post(self.url("/api/detect"))
            .query(&[("confidence_threshold", threshold.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DetectorError::Response {
            details: e.to_string(),
        })
    }

    async fn health(&self) -> Result<HealthReport, DetectorError> {
        let response = self.client.get(self.url("/health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn classes(&self) -> Result<ClassCatalogue, DetectorError> {
        let response = self.client.get(self.url("/api/classes")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }
}

/// Outcome of [`DetectionAdapter::analyze`]: always a result, sometimes an error to display
#[derive(Debug)]
pub struct Analysis {
    pub result: DetectionResult,
    pub error: Option<DetectorError>,
}

/// Normalizes detector round-trips into [`DetectionResult`]s. Performs no retries.
#[derive(Clone)]
pub struct DetectionAdapter {
    client: Arc<dyn DetectionClient>,
    verify_labels: bool,
}

impl DetectionAdapter {
    pub fn new(client: Arc<dyn DetectionClient>, verify_labels: bool) -> Self {
        Self {
            client,
            verify_labels,
        }
    }

    pub fn client(&self) -> Arc<dyn DetectionClient> {
        Arc::clone(&self.client)
    }

    pub async fn analyze(
        &self,
        frame: &FrameData,
        target: &str,
        confidence_threshold: f64,
    ) -> Analysis {
        match self.client.detect(frame, target, confidence_threshold).await {
            Ok(response) => {
                let result = DetectionResult::from_response(response, target, self.verify_labels);
                debug!(
                    "Detector returned {} objects for '{}' (match: {})",
                    result.matches.len(),
                    target,
                    result.matches_target
                );
                Analysis {
                    result,
                    error: None,
                }
            }
            Err(e @ DetectorError::Response { .. }) => {
                warn!("Ignoring malformed detector response: {}", e);
                Analysis {
                    result: DetectionResult::no_match(),
                    error: Some(e),
                }
            }
            Err(e) => {
                warn!("Detector request failed: {}", e);
                Analysis {
                    result: DetectionResult::failed(),
                    error: Some(e),
                }
            }
        }
    }

    /// Log backend health and warn about items the model cannot detect
    pub async fn probe(&self, items: &[String]) {
        match self.client.health().await {
            Ok(report) if report.model_loaded => {
                info!(
                    "Detector healthy ({}), model {} with {} classes",
                    report.status,
                    report.model_info.as_ref().map(|m| m.version.as_str()).unwrap_or("unknown"),
                    report.model_info.as_ref().map(|m| m.classes).unwrap_or(0)
                );
            }
            Ok(report) => warn!("Detector reachable ({}) but model is not loaded", report.status),
            Err(e) => {
                warn!("Detector health check failed: {}", e);
                return;
            }
        }

        match self.client.classes().await {
            Ok(catalogue) if catalogue.classes.is_empty() => {
                debug!("Detector reported an empty class catalogue");
            }
            Ok(catalogue) => {
                let unknown = catalogue.unknown_items(items);
                if !unknown.is_empty() {
                    warn!("Detector cannot recognise items: {}", unknown.join(", "));
                }
            }
            Err(e) => debug!("Detector class catalogue unavailable: {}", e),
        }
    }
}
