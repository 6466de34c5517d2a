use super::FrameProvider;
use crate::frame::{FrameData, FrameFormat};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::debug;

/// Mock camera for testing without real hardware
pub struct MockCamera {
    payload: Vec<u8>,
    available: AtomicBool,
    snapshots: AtomicU64,
}

impl MockCamera {
    /// Camera that always produces a small JPEG-looking frame
    pub fn new() -> Self {
        Self::with_payload(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9])
    }

    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            available: AtomicBool::new(true),
            snapshots: AtomicU64::new(0),
        }
    }

    /// Camera that never has a frame ready
    pub fn unavailable() -> Self {
        let camera = Self::new();
        camera.set_available(false);
        camera
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of snapshot calls, including ones that yielded nothing
    pub fn snapshot_calls(&self) -> u64 {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProvider for MockCamera {
    fn snapshot(&self) -> Option<FrameData> {
        let id = self.snapshots.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.available.load(Ordering::SeqCst) {
            debug!("Mock camera has no frame ready");
            return None;
        }

        Some(FrameData::new(
            id,
            SystemTime::now(),
            self.payload.clone(),
            FrameFormat::Jpeg,
        ))
    }
}
