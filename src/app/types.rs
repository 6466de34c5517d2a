use crate::capture::CaptureReport;
use crate::game::{Deferred, SessionSnapshot};
use tokio::sync::oneshot;

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
}

/// Messages processed in order by the game loop
#[derive(Debug)]
pub enum GameCommand {
    /// Start a round now; restarts a finished game
    StartGame,
    /// Restore the session to its initial state
    Reset,
    /// One-off capture through the throttle
    Capture,
    /// Reply with the current session state
    Snapshot(oneshot::Sender<SessionSnapshot>),
    /// A scheduled action came due
    Deferred { action: Deferred, generation: u64 },
    /// A detector round-trip finished
    CaptureFinished(CaptureReport),
}
