use super::*;
use crate::config::CameraConfig;
use crate::frame::FrameFormat;
use std::fs;
use std::thread;
use std::time::Duration;

#[test]
fn test_snapshot_camera_reads_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.jpg");
    fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

    let camera = SnapshotCamera::from_path(&path);
    let frame = camera.snapshot().expect("frame should be available");

    assert_eq!(frame.id, 1);
    assert_eq!(frame.format, FrameFormat::Jpeg);
    assert_eq!(frame.data.as_slice(), &[0xFF, 0xD8, 0xFF, 0xD9]);
    assert_eq!(camera.frame_count(), 1);
}

#[test]
fn test_snapshot_camera_picks_newest_image_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("old.jpg"), b"old").unwrap();
    thread::sleep(Duration::from_millis(20));
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
    thread::sleep(Duration::from_millis(20));
    fs::write(dir.path().join("new.png"), b"new").unwrap();

    let camera = SnapshotCamera::new(&CameraConfig {
        snapshot_path: dir.path().to_string_lossy().to_string(),
    });
    let frame = camera.snapshot().unwrap();

    assert_eq!(frame.format, FrameFormat::Png);
    assert_eq!(frame.data.as_slice(), b"new");
}

#[test]
fn test_snapshot_camera_without_images_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let camera = SnapshotCamera::from_path(dir.path());
    assert!(camera.snapshot().is_none());

    let missing = SnapshotCamera::from_path(dir.path().join("missing"));
    assert!(missing.snapshot().is_none());
    assert_eq!(missing.frame_count(), 0);
}

#[test]
fn test_snapshot_camera_skips_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.jpg");
    fs::write(&path, b"").unwrap();

    let camera = SnapshotCamera::from_path(&path);
    assert!(camera.snapshot().is_none());
}

#[test]
fn test_mock_camera_availability() {
    let camera = MockCamera::new();
    assert!(camera.snapshot().is_some());

    camera.set_available(false);
    assert!(camera.snapshot().is_none());
    assert_eq!(camera.snapshot_calls(), 2);

    let unavailable = MockCamera::unavailable();
    assert!(unavailable.snapshot().is_none());
}
