use super::{GameOrchestrator, ShutdownReason};
use crate::error::{Result, ScavengerError};
use crate::events::{EventFilter, EventReceiver, GameEvent};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

type SharedShutdown = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

impl GameOrchestrator {
    /// Run until a signal or the player asks to quit
    pub async fn run(&mut self) -> Result<i32> {
        info!("Scavenger hunt is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| ScavengerError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| ScavengerError::system("Shutdown receiver already taken"))?;

        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(Arc::clone(&shutdown_sender));
        self.watch_shutdown_requests(shutdown_sender);

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| ScavengerError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?;

        info!("Scavenger hunt shutdown complete");
        Ok(exit_code)
    }

    /// Request shutdown from inside the process
    pub async fn request_shutdown(&self, reason: &str) -> Result<()> {
        self.event_bus
            .publish(GameEvent::ShutdownRequested {
                reason: reason.to_string(),
            })
            .await?;
        Ok(())
    }

    fn setup_signal_handlers(&self, shutdown_sender: SharedShutdown) {
        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }

    fn watch_shutdown_requests(&self, shutdown_sender: SharedShutdown) {
        let mut receiver = EventReceiver::new(
            self.event_bus.subscribe(),
            EventFilter::EventTypes(vec!["shutdown_requested"]),
            "shutdown".to_string(),
        );
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                event = receiver.recv() => {
                    if let Ok(GameEvent::ShutdownRequested { .. }) = event {
                        if let Some(sender) = shutdown_sender.lock().await.take() {
                            let _ = sender.send(ShutdownReason::UserRequest);
                        }
                    }
                }
            }
        });
    }
}
