pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod frame;
pub mod game;
pub mod keyboard_input;
pub mod presenter;

pub use app::{ComponentState, GameCommand, GameOrchestrator, ShutdownReason};
pub use camera::{FrameProvider, MockCamera, SnapshotCamera};
pub use capture::{CaptureReport, CaptureThrottle};
pub use config::ScavengerConfig;
pub use detector::{
    DetectionAdapter, DetectionClient, DetectionResult, HttpDetectionClient, MockDetector,
};
pub use error::{Result, ScavengerError};
pub use events::{EventBus, EventFilter, EventReceiver, GameEvent};
pub use frame::{FrameData, FrameFormat};
pub use game::{
    ItemPool, RoundController, RoundTicket, SessionController, SessionRules, SessionSnapshot,
};
pub use presenter::{format_time, ConsolePresenter};
