use crate::app::GameCommand;
use crate::error::Result;
use crate::events::{EventBus, GameEvent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Analyze,
    Start,
    Reset,
    Quit,
}

impl KeyAction {
    pub fn from_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Self> {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
            KeyCode::Char(' ') | KeyCode::Enter => Some(Self::Analyze),
            KeyCode::Char('s') => Some(Self::Start),
            KeyCode::Char('r') => Some(Self::Reset),
            KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }

    fn command(self) -> Option<GameCommand> {
        match self {
            Self::Analyze => Some(GameCommand::Capture),
            Self::Start => Some(GameCommand::StartGame),
            Self::Reset => Some(GameCommand::Reset),
            Self::Quit => None,
        }
    }
}

/// Terminal controls for the game
pub struct KeyboardInputHandler {
    commands: mpsc::Sender<GameCommand>,
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(commands: mpsc::Sender<GameCommand>, event_bus: Arc<EventBus>) -> Self {
        Self {
            commands,
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler");

        let commands = self.commands.clone();
        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();
        let runtime_handle = Handle::current();

        task::spawn_blocking(move || {
            // Raw mode delivers individual key presses
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(action) = KeyAction::from_key(key_event.code, key_event.modifiers)
                        else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        if action == KeyAction::Quit {
                            info!("Quit key pressed - requesting shutdown");

                            let shutdown_event = GameEvent::ShutdownRequested {
                                reason: "User requested via keyboard".to_string(),
                            };
                            let event_bus_clone = Arc::clone(&event_bus);
                            runtime_handle.spawn(async move {
                                if let Err(e) = event_bus_clone.publish(shutdown_event).await {
                                    warn!("Failed to publish shutdown event: {}", e);
                                }
                            });
                            break;
                        }

                        if let Some(command) = action.command() {
                            debug!("Key action {:?}", action);
                            if commands.blocking_send(command).is_err() {
                                warn!("Game loop is not accepting commands");
                                break;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to disable raw mode itself
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _ = disable_raw_mode();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;
        assert_eq!(
            KeyAction::from_key(KeyCode::Char(' '), none),
            Some(KeyAction::Analyze)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('s'), none),
            Some(KeyAction::Start)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('r'), none),
            Some(KeyAction::Reset)
        );
        assert_eq!(KeyAction::from_key(KeyCode::Esc, none), Some(KeyAction::Quit));
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Quit)
        );
        assert_eq!(KeyAction::from_key(KeyCode::Char('c'), none), None);
    }

    #[test]
    fn test_quit_sends_no_command() {
        assert!(KeyAction::Quit.command().is_none());
        assert!(matches!(
            KeyAction::Analyze.command(),
            Some(GameCommand::Capture)
        ));
    }

    #[tokio::test]
    async fn test_keyboard_handler_stop() {
        let (commands, _receiver) = mpsc::channel(4);
        let event_bus = Arc::new(EventBus::new(16));
        let handler = KeyboardInputHandler::new(commands, event_bus);

        handler.stop().await.unwrap();
        assert!(handler.cancellation_token.is_cancelled());
    }
}
