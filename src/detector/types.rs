use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One object reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

/// Raw body of `POST /api/detect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
    #[serde(default)]
    pub total_objects: Option<u64>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

impl DetectionResponse {
    /// Successful response carrying the given detections
    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self {
            success: Some(true),
            total_objects: Some(detections.len() as u64),
            detections: Some(detections),
            confidence_threshold: None,
        }
    }
}

/// Normalized outcome of one analysis attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    /// The call completed without transport or server error
    pub succeeded: bool,
    pub matches: Vec<Detection>,
    pub matches_target: bool,
}

impl DetectionResult {
    /// Result of a call that never produced a usable response
    pub fn failed() -> Self {
        Self::default()
    }

    /// Result of a call that completed but found nothing usable
    pub fn no_match() -> Self {
        Self {
            succeeded: true,
            ..Self::default()
        }
    }

    /// Result that confirms the target
    pub fn found(matches: Vec<Detection>) -> Self {
        Self {
            succeeded: true,
            matches,
            matches_target: true,
        }
    }

    /// Interpret a detector payload.
    ///
    /// With `verify_labels` unset the server-side `target_class` filter is trusted and any
    /// detection counts; otherwise one detection must carry the target label.
    pub fn from_response(response: DetectionResponse, target: &str, verify_labels: bool) -> Self {
        if response.success != Some(true) {
            return Self::no_match();
        }

        let matches: Vec<Detection> = response
            .detections
            .unwrap_or_default()
            .into_iter()
            .filter(|d| d.confidence.is_finite())
            .map(|d| Detection {
                confidence: d.confidence.clamp(0.0, 1.0),
                ..d
            })
            .collect();

        let matches_target = if verify_labels {
            matches.iter().any(|d| labels_match(&d.label, target))
        } else {
            !matches.is_empty()
        };

        Self {
            succeeded: true,
            matches,
            matches_target,
        }
    }
}

/// Case-insensitive label comparison treating `_` and spaces alike
pub fn labels_match(a: &str, b: &str) -> bool {
    fn normalize(label: &str) -> String {
        label.trim().to_lowercase().replace('_', " ")
    }
    normalize(a) == normalize(b)
}

/// Body of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub classes: u32,
}

/// Body of `GET /api/classes`; class ids are JSON object keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassCatalogue {
    #[serde(default)]
    pub classes: HashMap<String, String>,
    #[serde(default)]
    pub total_classes: u32,
}

impl ClassCatalogue {
    pub fn contains(&self, label: &str) -> bool {
        self.classes.values().any(|name| labels_match(name, label))
    }

    /// Items the detector cannot recognise
    pub fn unknown_items<'a>(&self, items: &'a [String]) -> Vec<&'a str> {
        items
            .iter()
            .filter(|item| !self.contains(item))
            .map(|item| item.as_str())
            .collect()
    }
}
