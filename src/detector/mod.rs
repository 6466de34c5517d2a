mod client;
mod mock;
mod types;

pub use client::{Analysis, DetectionAdapter, DetectionClient, HttpDetectionClient};
pub use mock::{MockDetector, RecordedRequest};
pub use types::{
    labels_match, ClassCatalogue, Detection, DetectionResponse, DetectionResult, HealthReport,
    ModelInfo,
};
