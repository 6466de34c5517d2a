use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScavengerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ScavengerError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Round and session state machine violations.
///
/// These indicate an orchestration bug rather than a runtime condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid transition: cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Item '{item}' is not in the remaining pool")]
    UnknownItem { item: String },
}

impl GameError {
    pub fn invalid(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { operation, state }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No frame available from camera")]
    NoFrameAvailable,
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Detector transport error: {details}")]
    Transport { details: String },

    #[error("Detector returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed detector response: {details}")]
    Response { details: String },
}

impl DetectorError {
    /// Transport and status failures are surfaced to the player; malformed payloads are not.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

impl From<reqwest::Error> for DetectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Response {
                details: err.to_string(),
            }
        } else {
            Self::Transport {
                details: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ScavengerError>;
