use super::{ComponentState, GameOrchestrator};
use crate::error::{Result, ScavengerError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const GAME_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const KEYBOARD_STOP_TIMEOUT: Duration = Duration::from_secs(2);

impl GameOrchestrator {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        // Stop components in reverse start order
        for component in ["keyboard", "game", "presenter"] {
            if let Err(e) = self.stop_component(component).await {
                error!("Error stopping {}: {}", component, e);
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    /// Stop a specific component
    async fn stop_component(&mut self, component: &str) -> Result<()> {
        if self.get_component_state(component).await.is_none() {
            return Ok(());
        }

        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let outcome = match component {
            "keyboard" => match &self.keyboard_handler {
                Some(keyboard_handler) => timeout(KEYBOARD_STOP_TIMEOUT, keyboard_handler.stop())
                    .await
                    .unwrap_or_else(|_| Err(stop_timeout(component))),
                None => Ok(()),
            },
            "game" => match self.game_task.take() {
                Some(task) => match timeout(GAME_STOP_TIMEOUT, task).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ScavengerError::component("game", e.to_string())),
                    Err(_) => Err(stop_timeout(component)),
                },
                None => Ok(()),
            },
            "presenter" => match &self.presenter {
                Some(presenter) => presenter.stop().await,
                None => Ok(()),
            },
            _ => Ok(()),
        };

        match outcome {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(())
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                Err(e)
            }
        }
    }
}

fn stop_timeout(component: &str) -> ScavengerError {
    ScavengerError::system(format!("{} component stop timeout", component))
}
