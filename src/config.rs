use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScavengerConfig {
    pub game: GameConfig,
    pub detector: DetectorConfig,
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameConfig {
    /// Labels to hunt, fixed for the whole session
    #[serde(default = "default_items")]
    pub items: Vec<String>,

    /// Round time budget in seconds
    #[serde(default = "default_round_seconds")]
    pub round_seconds: u32,

    /// Minimum points awarded per find
    #[serde(default = "default_score_floor")]
    pub score_floor: u32,

    /// Remaining seconds are divided by this to compute the time bonus
    #[serde(default = "default_score_divisor")]
    pub score_divisor: u32,

    /// Pause after a find before the next round starts
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause after a timeout before the next round starts
    #[serde(default = "default_timeout_delay_ms")]
    pub timeout_delay_ms: u64,

    /// Start the first round as soon as the game loop is running
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    /// Base URL of the detection service
    #[serde(default = "default_detector_base_url")]
    pub base_url: String,

    /// Confidence threshold sent with every request
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Require a returned class to equal the target instead of trusting the server filter
    #[serde(default = "default_verify_labels")]
    pub verify_labels: bool,

    /// Transport-level guard for a hung request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// JPEG file, or directory whose newest image is used as the snapshot
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Seconds between automatic capture attempts
    #[serde(default = "default_capture_interval")]
    pub interval_seconds: u32,

    /// Enable the automatic capture cadence
    #[serde(default = "default_auto_capture")]
    pub auto_capture: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Enable keyboard controls on the terminal
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

impl ScavengerConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("scavenger.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("game.items", default_items())?
            .set_default("game.round_seconds", default_round_seconds())?
            .set_default("game.score_floor", default_score_floor())?
            .set_default("game.score_divisor", default_score_divisor())?
            .set_default("game.settle_delay_ms", default_settle_delay_ms())?
            .set_default("game.timeout_delay_ms", default_timeout_delay_ms())?
            .set_default("game.auto_start", default_auto_start())?
            .set_default("detector.base_url", default_detector_base_url())?
            .set_default(
                "detector.confidence_threshold",
                default_confidence_threshold(),
            )?
            .set_default("detector.verify_labels", default_verify_labels())?
            .set_default("detector.request_timeout_ms", default_request_timeout_ms())?
            .set_default("camera.snapshot_path", default_snapshot_path())?
            .set_default("capture.interval_seconds", default_capture_interval())?
            .set_default("capture.auto_capture", default_auto_capture())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("system.keyboard", default_keyboard())?
            .add_source(File::with_name(&path_str).required(false))
            // Environment variables with SCAVENGER_ prefix, e.g. SCAVENGER_GAME__ROUND_SECONDS
            .add_source(
                Environment::with_prefix("SCAVENGER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ScavengerConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.items.is_empty() {
            return Err(ConfigError::Message(
                "Game items must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for item in &self.game.items {
            if item.trim().is_empty() {
                return Err(ConfigError::Message(
                    "Game items must not contain blank labels".to_string(),
                ));
            }
            if !seen.insert(item.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate game item: {}",
                    item
                )));
            }
        }

        if self.game.round_seconds == 0 {
            return Err(ConfigError::Message(
                "Round seconds must be greater than 0".to_string(),
            ));
        }

        if self.game.score_divisor == 0 {
            return Err(ConfigError::Message(
                "Score divisor must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(ConfigError::Message(
                "Confidence threshold must be within [0, 1]".to_string(),
            ));
        }

        if self.detector.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Detector base_url must be set".to_string(),
            ));
        }

        if self.capture.interval_seconds == 0 {
            return Err(ConfigError::Message(
                "Capture interval must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl GameConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_delay_ms)
    }
}

impl CaptureConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds as u64)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            items: default_items(),
            round_seconds: default_round_seconds(),
            score_floor: default_score_floor(),
            score_divisor: default_score_divisor(),
            settle_delay_ms: default_settle_delay_ms(),
            timeout_delay_ms: default_timeout_delay_ms(),
            auto_start: default_auto_start(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_detector_base_url(),
            confidence_threshold: default_confidence_threshold(),
            verify_labels: default_verify_labels(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ScavengerConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            detector: DetectorConfig::default(),
            camera: CameraConfig {
                snapshot_path: default_snapshot_path(),
            },
            capture: CaptureConfig {
                interval_seconds: default_capture_interval(),
                auto_capture: default_auto_capture(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                keyboard: default_keyboard(),
            },
        }
    }
}

// Default value functions
fn default_items() -> Vec<String> {
    [
        "cup",
        "bottle",
        "cell phone",
        "book",
        "scissors",
        "banana",
        "remote",
        "keyboard",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_round_seconds() -> u32 {
    300
}
fn default_score_floor() -> u32 {
    100
}
fn default_score_divisor() -> u32 {
    3
}
fn default_settle_delay_ms() -> u64 {
    3000
}
fn default_timeout_delay_ms() -> u64 {
    1000
}
fn default_auto_start() -> bool {
    true
}

fn default_detector_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_confidence_threshold() -> f64 {
    0.5
}
fn default_verify_labels() -> bool {
    false
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_snapshot_path() -> String {
    "./snapshots".to_string()
}

fn default_capture_interval() -> u32 {
    2
}
fn default_auto_capture() -> bool {
    true
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_keyboard() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScavengerConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.game.round_seconds, 300);
        assert_eq!(config.game.score_floor, 100);
        assert_eq!(config.capture.interval_seconds, 2);
        assert_eq!(config.detector.confidence_threshold, 0.5);
        assert_eq!(config.game.settle_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[game]
items = ["cup", "bottle"]
round_seconds = 60

[detector]
base_url = "http://detector:9000"
"#
        )
        .unwrap();

        let config = ScavengerConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.game.items, vec!["cup", "bottle"]);
        assert_eq!(config.game.round_seconds, 60);
        assert_eq!(config.game.score_divisor, 3);
        assert_eq!(config.detector.base_url, "http://detector:9000");
        assert_eq!(config.capture.interval_seconds, 2);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScavengerConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.game.items, default_items());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScavengerConfig::default();

        config.game.items = vec!["cup".to_string(), "cup".to_string()];
        assert!(config.validate().is_err());

        config.game.items = vec!["cup".to_string()];
        assert!(config.validate().is_ok());

        config.detector.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
        config.detector.confidence_threshold = 0.5;

        config.game.score_divisor = 0;
        assert!(config.validate().is_err());
        config.game.score_divisor = 3;

        config.capture.interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let mut config = ScavengerConfig::default();
        config.game.items.clear();
        assert!(config.validate().is_err());
    }
}
