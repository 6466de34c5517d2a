use crate::detector::Detection;
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Presentation events emitted by the game core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new round began hunting `target`
    RoundStarted {
        round: u32,
        target: String,
        time_budget: u32,
    },
    /// The round clock moved
    TimeChanged { target: String, time_remaining: u32 },
    /// The target was confirmed by the detector
    RoundSucceeded {
        target: String,
        time_remaining: u32,
        points: u32,
        detections: Vec<Detection>,
    },
    /// A completed analysis did not contain the target
    RoundMismatch {
        target: String,
        detections: Vec<Detection>,
    },
    /// The round clock reached zero
    RoundTimedOut { target: String },
    /// The session score changed
    ScoreChanged { score: u32 },
    /// A detector request started or finished
    AnalysisStateChanged { in_flight: bool },
    /// Every item in the pool has been resolved
    GameCompleted {
        score: u32,
        completed: Vec<String>,
        timed_out: Vec<String>,
    },
    /// The session was restored to its initial state
    SessionReset,
    /// The detector could not be reached; the round continues
    DetectorError { message: String },
    /// Shutdown requested by the player or a signal
    ShutdownRequested { reason: String },
}

impl GameEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            GameEvent::RoundStarted {
                round,
                target,
                time_budget,
            } => format!(
                "Round {} started: find '{}' within {}s",
                round, target, time_budget
            ),
            GameEvent::TimeChanged {
                target,
                time_remaining,
            } => format!("{}s left to find '{}'", time_remaining, target),
            GameEvent::RoundSucceeded { target, points, .. } => {
                format!("Found '{}' for {} points", target, points)
            }
            GameEvent::RoundMismatch { target, detections } => format!(
                "'{}' not found ({} other objects seen)",
                target,
                detections.len()
            ),
            GameEvent::RoundTimedOut { target } => format!("Time's up for '{}'", target),
            GameEvent::ScoreChanged { score } => format!("Score: {}", score),
            GameEvent::AnalysisStateChanged { in_flight } => {
                if *in_flight {
                    "Analysis started".to_string()
                } else {
                    "Analysis finished".to_string()
                }
            }
            GameEvent::GameCompleted {
                score,
                completed,
                timed_out,
            } => format!(
                "Game completed with score {} ({} found, {} missed)",
                score,
                completed.len(),
                timed_out.len()
            ),
            GameEvent::SessionReset => "Session reset".to_string(),
            GameEvent::DetectorError { message } => format!("Analysis failed: {}", message),
            GameEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::TimeChanged { .. } => "time_changed",
            GameEvent::RoundSucceeded { .. } => "round_succeeded",
            GameEvent::RoundMismatch { .. } => "round_mismatch",
            GameEvent::RoundTimedOut { .. } => "round_timed_out",
            GameEvent::ScoreChanged { .. } => "score_changed",
            GameEvent::AnalysisStateChanged { .. } => "analysis_state_changed",
            GameEvent::GameCompleted { .. } => "game_completed",
            GameEvent::SessionReset => "session_reset",
            GameEvent::DetectorError { .. } => "detector_error",
            GameEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for the presentation layer using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<GameEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: GameEvent) -> Result<usize, EventBusError> {
        match &event {
            GameEvent::RoundStarted { .. }
            | GameEvent::RoundSucceeded { .. }
            | GameEvent::RoundTimedOut { .. }
            | GameEvent::GameCompleted { .. }
            | GameEvent::SessionReset => {
                info!("{}", event.description());
            }
            GameEvent::DetectorError { message } => {
                warn!("Detector error: {}", message);
            }
            GameEvent::ShutdownRequested { reason } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                trace!("Event: {}", event.description());
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&GameEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &GameEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<GameEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(receiver: broadcast::Receiver<GameEvent>, filter: EventFilter, name: String) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<GameEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Missed events are dropped; keep receiving
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<GameEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let event = GameEvent::ScoreChanged { score: 100 };

        let subscriber_count = event_bus.publish(event.clone()).await.unwrap();
        assert_eq!(subscriber_count, 1);

        let received_event = receiver.recv().await.unwrap();
        assert_eq!(received_event, event);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_fails() {
        let event_bus = EventBus::new(10);
        let result = event_bus.publish(GameEvent::SessionReset).await;
        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus
            .publish(GameEvent::RoundTimedOut {
                target: "cup".to_string(),
            })
            .await
            .unwrap();

        let _ = timeout(Duration::from_millis(100), receiver1.recv())
            .await
            .unwrap()
            .unwrap();
        let _ = timeout(Duration::from_millis(100), receiver2.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_filtered_receiver() {
        let event_bus = EventBus::new(10);
        let receiver = event_bus.subscribe();
        let filter = EventFilter::EventTypes(vec!["score_changed"]);
        let mut filtered_receiver = EventReceiver::new(receiver, filter, "test".to_string());

        event_bus
            .publish(GameEvent::AnalysisStateChanged { in_flight: true })
            .await
            .unwrap();
        event_bus
            .publish(GameEvent::ScoreChanged { score: 250 })
            .await
            .unwrap();

        let received = timeout(Duration::from_millis(100), filtered_receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, GameEvent::ScoreChanged { score: 250 });
        assert_eq!(filtered_receiver.try_recv().unwrap(), None);
    }

    #[test]
    fn test_event_properties() {
        let event = GameEvent::RoundSucceeded {
            target: "bottle".to_string(),
            time_remaining: 120,
            points: 100,
            detections: Vec::new(),
        };

        assert_eq!(event.event_type(), "round_succeeded");
        assert!(event.description().contains("bottle"));
        assert!(EventFilter::Custom(|e| matches!(e, GameEvent::RoundSucceeded { .. }))
            .matches(&event));
    }
}
