use super::{ComponentState, GameOrchestrator};
use crate::error::Result;
use tracing::{error, info};

impl GameOrchestrator {
    /// Register components and probe the detection backend
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing scavenger hunt components");

        let mut states = self.component_states.lock().await;
        states.insert("game".to_string(), ComponentState::Stopped);
        if self.presenter.is_some() {
            states.insert("presenter".to_string(), ComponentState::Stopped);
        }
        if self.keyboard_enabled {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }
        drop(states);

        self.adapter.probe(&self.config.game.items).await;

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start the presenter, the game loop, and keyboard controls
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting scavenger hunt");

        // Subscribe before the loop publishes its first round
        if let Some(presenter) = &self.presenter {
            self.set_component_state("presenter", ComponentState::Starting)
                .await;
            presenter.start()?;
            self.set_component_state("presenter", ComponentState::Running)
                .await;
        }

        self.set_component_state("game", ComponentState::Starting)
            .await;
        let game_loop = self.build_game_loop().map_err(|e| {
            error!("Failed to build game loop: {}", e);
            e
        })?;
        self.game_task = Some(tokio::spawn(game_loop.run()));
        self.set_component_state("game", ComponentState::Running)
            .await;
        info!(
            "Game loop running: {} items, {}s rounds, capture every {}s",
            self.config.game.items.len(),
            self.config.game.round_seconds,
            self.config.capture.interval_seconds
        );

        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting)
                    .await;

                keyboard_handler.start().await.map_err(|e| {
                    error!("Failed to start keyboard handler: {}", e);
                    e
                })?;

                self.set_component_state("keyboard", ComponentState::Running)
                    .await;
                info!("Keyboard controls active: SPACE analyze, s start, r reset, q quit");
            }
        }

        info!("Scavenger hunt started successfully");
        Ok(())
    }
}
