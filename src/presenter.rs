use crate::detector::Detection;
use crate::error::Result;
use crate::events::{EventBus, EventFilter, EventReceiver, GameEvent};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Text line for an event, or `None` when the event is not worth showing
pub fn render(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::RoundStarted {
            round,
            target,
            time_budget,
        } => Some(format!(
            "Round {}: find a {} ({})",
            round,
            target,
            format_time(*time_budget)
        )),
        GameEvent::TimeChanged {
            target,
            time_remaining,
        } if *time_remaining <= 10 || time_remaining % 30 == 0 => Some(format!(
            "{} left to find the {}",
            format_time(*time_remaining),
            target
        )),
        GameEvent::TimeChanged { .. } => None,
        GameEvent::RoundSucceeded {
            target,
            points,
            detections,
            ..
        } => Some(format!(
            "Found the {}! +{} points [{}]",
            target,
            points,
            describe(detections)
        )),
        GameEvent::RoundMismatch { target, detections } if detections.is_empty() => {
            Some(format!("No {} in view yet", target))
        }
        GameEvent::RoundMismatch { target, detections } => Some(format!(
            "No {} in view, saw: {}",
            target,
            describe(detections)
        )),
        GameEvent::RoundTimedOut { target } => Some(format!("Time's up for the {}", target)),
        GameEvent::ScoreChanged { score } => Some(format!("Score: {}", score)),
        GameEvent::AnalysisStateChanged { .. } => None,
        GameEvent::GameCompleted {
            score,
            completed,
            timed_out,
        } => Some(format!(
            "Game complete! Final score {} ({} found, {} missed)",
            score,
            completed.len(),
            timed_out.len()
        )),
        GameEvent::SessionReset => Some("Game reset, press s to start".to_string()),
        GameEvent::DetectorError { message } => Some(format!("Detector unavailable: {}", message)),
        GameEvent::ShutdownRequested { .. } => Some("Goodbye".to_string()),
    }
}

fn describe(detections: &[Detection]) -> String {
    detections
        .iter()
        .map(|d| format!("{} {:.0}%", d.label, d.confidence * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints game events to the terminal
pub struct ConsolePresenter {
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConsolePresenter {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Subscribe and start printing; the subscription is live when this returns
    pub fn start(&self) -> Result<()> {
        let mut receiver = EventReceiver::new(
            self.event_bus.subscribe(),
            EventFilter::All,
            "console".to_string(),
        );
        let token = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = token.cancelled() => break,
                    event = receiver.recv() => match event {
                        Ok(event) => event,
                        Err(_) => break,
                    },
                };

                if let Some(line) = render(&event) {
                    // Raw mode needs an explicit carriage return
                    let mut stdout = std::io::stdout().lock();
                    let _ = write!(stdout, "{}\r\n", line);
                    let _ = stdout.flush();
                }
            }
            debug!("Console presenter exited");
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        self.cancellation_token.cancel();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(300), "5:00");
        assert_eq!(format_time(297), "4:57");
        assert_eq!(format_time(9), "0:09");
        assert_eq!(format_time(0), "0:00");
    }

    #[test]
    fn test_render_skips_noise() {
        assert!(render(&GameEvent::AnalysisStateChanged { in_flight: true }).is_none());
        assert!(render(&GameEvent::TimeChanged {
            target: "cup".to_string(),
            time_remaining: 297,
        })
        .is_none());
        assert_eq!(
            render(&GameEvent::TimeChanged {
                target: "cup".to_string(),
                time_remaining: 240,
            })
            .as_deref(),
            Some("4:00 left to find the cup")
        );
    }

    #[test]
    fn test_render_mismatch_lists_detections() {
        let line = render(&GameEvent::RoundMismatch {
            target: "cup".to_string(),
            detections: vec![Detection {
                label: "person".to_string(),
                confidence: 0.92,
            }],
        });
        assert_eq!(line.as_deref(), Some("No cup in view, saw: person 92%"));
    }

    #[tokio::test]
    async fn test_presenter_stops_cleanly() {
        let event_bus = Arc::new(EventBus::new(16));
        let presenter = ConsolePresenter::new(Arc::clone(&event_bus));

        presenter.start().unwrap();
        assert_eq!(event_bus.subscriber_count(), 1);

        event_bus
            .publish(GameEvent::ScoreChanged { score: 100 })
            .await
            .unwrap();
        presenter.stop().await.unwrap();
        assert_eq!(event_bus.subscriber_count(), 0);
    }
}
