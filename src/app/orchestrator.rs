use super::game_loop::GameLoop;
use super::types::{ComponentState, GameCommand, ShutdownReason};
use crate::camera::{FrameProvider, SnapshotCamera};
use crate::capture::CaptureThrottle;
use crate::config::ScavengerConfig;
use crate::detector::{DetectionAdapter, DetectionClient, HttpDetectionClient};
use crate::error::{Result, ScavengerError};
use crate::events::EventBus;
use crate::game::{
    ItemPool, RandomPicker, SessionController, SessionRules, SessionSnapshot, TargetPicker,
};
use crate::keyboard_input::KeyboardInputHandler;
use crate::presenter::ConsolePresenter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const COMMAND_CAPACITY: usize = 64;

/// Main application coordinator that wires the game loop to its collaborators
pub struct GameOrchestrator {
    pub(super) config: ScavengerConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) camera: Arc<dyn FrameProvider>,
    pub(super) adapter: DetectionAdapter,
    pub(super) picker: Option<Box<dyn TargetPicker>>,

    // Game loop
    pub(super) commands: mpsc::Sender<GameCommand>,
    pub(super) command_receiver: Option<mpsc::Receiver<GameCommand>>,
    pub(super) game_task: Option<JoinHandle<()>>,

    // Components
    pub(super) presenter: Option<ConsolePresenter>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl GameOrchestrator {
    /// Create an orchestrator backed by the HTTP detector and the snapshot camera
    pub async fn new(config: ScavengerConfig) -> Result<Self> {
        let camera: Arc<dyn FrameProvider> = Arc::new(SnapshotCamera::new(&config.camera));
        let client: Arc<dyn DetectionClient> =
            Arc::new(HttpDetectionClient::new(&config.detector)?);
        Ok(Self::with_components(config, camera, client))
    }

    /// Create an orchestrator with explicit camera and detector implementations
    pub fn with_components(
        config: ScavengerConfig,
        camera: Arc<dyn FrameProvider>,
        client: Arc<dyn DetectionClient>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let adapter = DetectionAdapter::new(client, config.detector.verify_labels);
        let (commands, command_receiver) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let presenter = Some(ConsolePresenter::new(Arc::clone(&event_bus)));
        let keyboard_handler = Some(KeyboardInputHandler::new(
            commands.clone(),
            Arc::clone(&event_bus),
        ));
        let keyboard_enabled = config.system.keyboard;

        Self {
            config,
            event_bus,
            camera,
            adapter,
            picker: Some(Box::new(RandomPicker::new())),
            commands,
            command_receiver: Some(command_receiver),
            game_task: None,
            presenter,
            keyboard_handler,
            keyboard_enabled,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Replace the target picker used by the session
    pub fn with_picker(mut self, picker: Box<dyn TargetPicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Enable or disable the keyboard input handler
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    /// Enable or disable console output of game events
    pub fn set_presenter_enabled(&mut self, enabled: bool) {
        if enabled {
            if self.presenter.is_none() {
                self.presenter = Some(ConsolePresenter::new(Arc::clone(&self.event_bus)));
            }
        } else {
            self.presenter = None;
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Handle for sending commands to the game loop
    pub fn commands(&self) -> mpsc::Sender<GameCommand> {
        self.commands.clone()
    }

    pub async fn send(&self, command: GameCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ScavengerError::component("game", "game loop is not running"))
    }

    /// Current session state as seen by the game loop
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(GameCommand::Snapshot(reply)).await?;
        response
            .await
            .map_err(|_| ScavengerError::component("game", "snapshot request dropped"))
    }

    pub(super) fn build_game_loop(&mut self) -> Result<GameLoop> {
        let receiver = self
            .command_receiver
            .take()
            .ok_or_else(|| ScavengerError::system("Game loop already started"))?;
        let picker = self
            .picker
            .take()
            .unwrap_or_else(|| Box::new(RandomPicker::new()));

        let session = SessionController::with_picker(
            ItemPool::new(self.config.game.items.iter().cloned()),
            SessionRules::from(&self.config.game),
            picker,
        );
        let throttle = CaptureThrottle::new(
            self.adapter.clone(),
            self.config.detector.confidence_threshold,
        );

        Ok(GameLoop {
            session,
            throttle,
            camera: Arc::clone(&self.camera),
            event_bus: Arc::clone(&self.event_bus),
            commands: self.commands.clone(),
            receiver,
            capture: self.config.capture.clone(),
            auto_start: self.config.game.auto_start,
            cancellation_token: self.cancellation_token.child_token(),
        })
    }
}
