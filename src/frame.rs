use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Still image encodings accepted by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    Jpeg,
    Png,
}

impl FrameFormat {
    /// MIME type sent with the multipart upload
    pub fn mime_type(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "image/jpeg",
            FrameFormat::Png => "image/png",
        }
    }

    /// File name sent with the multipart upload
    pub fn file_name(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "frame.jpg",
            FrameFormat::Png => "frame.png",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(FrameFormat::Jpeg),
            "png" => Some(FrameFormat::Png),
            _ => None,
        }
    }
}

/// A single still snapshot taken from the camera
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Encoded image bytes (shared ownership for efficiency)
    pub data: Arc<Vec<u8>>,
    /// Image encoding
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(id: u64, timestamp: SystemTime, data: Vec<u8>, format: FrameFormat) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            format,
        }
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FrameFormat::from_path(Path::new("shot.JPG")),
            Some(FrameFormat::Jpeg)
        );
        assert_eq!(
            FrameFormat::from_path(Path::new("shot.png")),
            Some(FrameFormat::Png)
        );
        assert_eq!(FrameFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(FrameFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_frame_data() {
        let frame = FrameData::new(7, SystemTime::now(), vec![0xFF, 0xD8], FrameFormat::Jpeg);
        assert_eq!(frame.len(), 2);
        assert!(!frame.is_empty());
        assert_eq!(frame.format.mime_type(), "image/jpeg");
        assert_eq!(frame.format.file_name(), "frame.jpg");
    }
}
