use super::types::GameCommand;
use crate::camera::FrameProvider;
use crate::capture::{CaptureReport, CaptureThrottle};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, GameError};
use crate::events::{EventBus, GameEvent};
use crate::game::{Deferred, Effect, SessionController};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

const ROUND_TICK: Duration = Duration::from_secs(1);

/// Single owner of the session; every state change happens on this task
pub(super) struct GameLoop {
    pub(super) session: SessionController,
    pub(super) throttle: CaptureThrottle,
    pub(super) camera: Arc<dyn FrameProvider>,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) commands: mpsc::Sender<GameCommand>,
    pub(super) receiver: mpsc::Receiver<GameCommand>,
    pub(super) capture: CaptureConfig,
    pub(super) auto_start: bool,
    pub(super) cancellation_token: CancellationToken,
}

impl GameLoop {
    pub(super) async fn run(mut self) {
        info!("Game loop started for session {}", self.session.id());

        let mut round_timer = interval_at(Instant::now() + ROUND_TICK, ROUND_TICK);
        round_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let cadence = self.capture.interval();
        let mut capture_timer = interval_at(Instant::now() + cadence, cadence);
        capture_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if self.auto_start {
            self.handle(GameCommand::StartGame).await;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    debug!("Game loop cancelled");
                    break;
                }
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => {
                        debug!("Command channel closed");
                        break;
                    }
                },
                _ = round_timer.tick() => {
                    let outcome = self.session.tick();
                    self.apply_outcome("tick", outcome).await;
                }
                _ = capture_timer.tick(), if self.capture.auto_capture => {
                    self.begin_capture().await;
                }
            }
        }

        info!("Game loop stopped");
    }

    async fn handle(&mut self, command: GameCommand) {
        match command {
            GameCommand::StartGame => {
                if self.session.is_round_active() {
                    warn!("Start requested while a round is active, ignoring");
                    return;
                }
                if self.session.is_completed() {
                    let effects = self.session.reset();
                    self.apply(effects).await;
                }
                let outcome = self.session.start_new_round();
                self.apply_outcome("start", outcome).await;
            }
            GameCommand::Reset => {
                let effects = self.session.reset();
                self.apply(effects).await;
            }
            GameCommand::Capture => self.begin_capture().await,
            GameCommand::Snapshot(reply) => {
                if reply.send(self.session.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
            }
            GameCommand::Deferred { action, generation } => {
                let outcome = self.session.run_deferred(action, generation);
                self.apply_outcome("deferred action", outcome).await;
            }
            GameCommand::CaptureFinished(report) => self.finish_capture(report).await,
        }
    }

    async fn begin_capture(&mut self) {
        let ticket = self.session.current_ticket();
        let pending = match self.throttle.begin(ticket, self.camera.as_ref()) {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(CaptureError::NoFrameAvailable) => {
                debug!("No frame available, capture skipped");
                return;
            }
        };

        trace!("Submitting frame {}", pending.frame_id());
        self.publish(GameEvent::AnalysisStateChanged { in_flight: true })
            .await;

        let commands = self.commands.clone();
        tokio::spawn(async move {
            let report = pending.run().await;
            if commands
                .send(GameCommand::CaptureFinished(report))
                .await
                .is_err()
            {
                debug!("Game loop gone, dropping capture report");
            }
        });
    }

    async fn finish_capture(&mut self, report: CaptureReport) {
        let CaptureReport {
            ticket, analysis, ..
        } = &report;

        if let Some(e) = analysis.error.as_ref().filter(|e| e.is_transport()) {
            self.publish(GameEvent::DetectorError {
                message: e.to_string(),
            })
            .await;
        }

        let outcome = self
            .session
            .report_detection(ticket, analysis.result.clone());
        self.apply_outcome("detection report", outcome).await;

        drop(report);
        self.publish(GameEvent::AnalysisStateChanged { in_flight: false })
            .await;
    }

    async fn apply_outcome(&mut self, operation: &str, outcome: Result<Vec<Effect>, GameError>) {
        match outcome {
            Ok(effects) => self.apply(effects).await,
            Err(e) => error!("Game state error during {}: {}", operation, e),
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Emit(event) => self.publish(event).await,
                Effect::Schedule {
                    delay,
                    action,
                    generation,
                } => self.schedule(delay, action, generation),
            }
        }
    }

    pub(super) fn schedule(&self, delay: Duration, action: Deferred, generation: u64) {
        debug!("Scheduling {:?} in {:?}", action, delay);

        let commands = self.commands.clone();
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if commands
                        .send(GameCommand::Deferred { action, generation })
                        .await
                        .is_err()
                    {
                        debug!("Game loop gone, dropping {:?}", action);
                    }
                }
            }
        });
    }

    async fn publish(&self, event: GameEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            trace!("Event not delivered: {}", e);
        }
    }
}
