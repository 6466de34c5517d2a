use crate::config::CameraConfig;
use crate::frame::{FrameData, FrameFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, info, trace};

/// Source of still frames for analysis.
///
/// `snapshot` is synchronous and returns `None` when the camera is not ready.
pub trait FrameProvider: Send + Sync {
    fn snapshot(&self) -> Option<FrameData>;
}

/// Camera that reads still images dropped on disk by an external capture process.
///
/// `snapshot_path` may name a single image file, or a directory in which case the
/// most recently modified image is used.
pub struct SnapshotCamera {
    path: PathBuf,
    frame_counter: AtomicU64,
}

impl SnapshotCamera {
    pub fn new(config: &CameraConfig) -> Self {
        info!("Initializing snapshot camera at {}", config.snapshot_path);
        Self::from_path(&config.snapshot_path)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame_counter: AtomicU64::new(0),
        }
    }

    /// Number of frames handed out so far
    pub fn frame_count(&self) -> u64 {
        self.frame_counter.load(Ordering::Relaxed)
    }

    fn latest_image(&self) -> Option<PathBuf> {
        if self.path.is_file() {
            return Some(self.path.clone());
        }

        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Snapshot directory {} unreadable: {}", self.path.display(), e);
                return None;
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && FrameFormat::from_path(path).is_some())
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, path)| path)
    }
}

impl FrameProvider for SnapshotCamera {
    fn snapshot(&self) -> Option<FrameData> {
        let path = self.latest_image()?;
        let format = FrameFormat::from_path(&path)?;

        let data = match fs::read(&path) {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                debug!("Snapshot {} is empty", path.display());
                return None;
            }
            Err(e) => {
                debug!("Failed to read snapshot {}: {}", path.display(), e);
                return None;
            }
        };

        let id = self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("Snapshot {} read from {} ({} bytes)", id, path.display(), data.len());

        Some(FrameData::new(id, SystemTime::now(), data, format))
    }
}
