use super::*;
use crate::camera::MockCamera;
use crate::config::ScavengerConfig;
use crate::detector::MockDetector;
use crate::error::DetectorError;
use crate::events::{EventFilter, EventReceiver, GameEvent};
use crate::game::{Deferred, SequentialPicker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn create_test_config(items: &[&str]) -> ScavengerConfig {
    let mut config = ScavengerConfig::default();
    config.game.items = items.iter().map(|item| item.to_string()).collect();
    config.system.keyboard = false;
    config
}

fn create_orchestrator(config: ScavengerConfig, detector: Arc<MockDetector>) -> GameOrchestrator {
    let mut orchestrator =
        GameOrchestrator::with_components(config, Arc::new(MockCamera::new()), detector)
            .with_picker(Box::new(SequentialPicker));
    orchestrator.set_presenter_enabled(false);
    orchestrator
}

fn subscribe(orchestrator: &GameOrchestrator, types: Vec<&'static str>) -> EventReceiver {
    EventReceiver::new(
        orchestrator.event_bus().subscribe(),
        EventFilter::EventTypes(types),
        "test".to_string(),
    )
}

async fn next_event(receiver: &mut EventReceiver) -> GameEvent {
    timeout(Duration::from_secs(60), receiver.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

#[tokio::test(start_paused = true)]
async fn test_found_item_scores_and_next_round_follows() {
    let detector = Arc::new(MockDetector::new());
    detector.push_found("cup");
    let mut orchestrator =
        create_orchestrator(create_test_config(&["cup", "bottle"]), detector.clone());
    let mut events = subscribe(
        &orchestrator,
        vec!["round_started", "round_succeeded", "score_changed", "round_mismatch"],
    );

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        GameEvent::RoundStarted {
            round: 1,
            target: "cup".to_string(),
            time_budget: 300,
        }
    );

    match next_event(&mut events).await {
        GameEvent::RoundSucceeded {
            target,
            time_remaining,
            points,
            ..
        } => {
            assert_eq!(target, "cup");
            assert!((297..300).contains(&time_remaining));
            assert_eq!(points, 100);
        }
        other => panic!("Expected RoundSucceeded, got {:?}", other),
    }
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::ScoreChanged { score: 100 }
    );

    let started = tokio::time::Instant::now();
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::RoundStarted {
            round: 2,
            target: "bottle".to_string(),
            time_budget: 300,
        }
    );
    assert!(started.elapsed() >= Duration::from_secs(3));

    assert_eq!(detector.calls(), 1);
    assert_eq!(detector.requests()[0].target, "cup");

    let snapshot = orchestrator.snapshot().await.unwrap();
    assert_eq!(snapshot.score, 100);
    assert_eq!(snapshot.completed_items, vec!["cup"]);
    assert_eq!(snapshot.current_round.unwrap().target, "bottle");

    assert_eq!(orchestrator.shutdown().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_last_item_timeout_completes_game() {
    let mut config = create_test_config(&["cup"]);
    config.game.round_seconds = 3;
    config.capture.auto_capture = false;
    let mut orchestrator = create_orchestrator(config, Arc::new(MockDetector::new()));
    let mut events = subscribe(
        &orchestrator,
        vec!["round_started", "round_timed_out", "game_completed"],
    );

    orchestrator.start().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        GameEvent::RoundStarted { round: 1, .. }
    ));
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::RoundTimedOut {
            target: "cup".to_string()
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::GameCompleted {
            score: 0,
            completed: Vec::new(),
            timed_out: vec!["cup".to_string()],
        }
    );

    let snapshot = orchestrator.snapshot().await.unwrap();
    assert!(snapshot.game_completed);
    assert!(!snapshot.game_active);
    assert!(snapshot.remaining_items.is_empty());

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_detector_outage_keeps_round_running() {
    let detector = Arc::new(MockDetector::new());
    detector.push_error(DetectorError::Transport {
        details: "connection refused".to_string(),
    });
    let mut config = create_test_config(&["cup"]);
    config.capture.auto_capture = false;
    let mut orchestrator = create_orchestrator(config, detector.clone());
    let mut events = subscribe(
        &orchestrator,
        vec!["analysis_state_changed", "detector_error", "round_mismatch"],
    );

    orchestrator.start().await.unwrap();
    orchestrator.send(GameCommand::Capture).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        GameEvent::AnalysisStateChanged { in_flight: true }
    );
    assert!(matches!(
        next_event(&mut events).await,
        GameEvent::DetectorError { .. }
    ));
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::AnalysisStateChanged { in_flight: false }
    );

    let snapshot = orchestrator.snapshot().await.unwrap();
    assert!(snapshot.game_active);
    assert_eq!(snapshot.current_round.unwrap().target, "cup");
    assert_eq!(snapshot.score, 0);
    assert_eq!(detector.calls(), 1);

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_capture_while_analyzing_is_dropped() {
    let detector = Arc::new(MockDetector::with_latency(Duration::from_secs(10)));
    let mut config = create_test_config(&["cup"]);
    config.capture.auto_capture = false;
    let mut orchestrator = create_orchestrator(config, detector.clone());
    let mut events = subscribe(&orchestrator, vec!["analysis_state_changed"]);

    orchestrator.start().await.unwrap();
    orchestrator.send(GameCommand::Capture).await.unwrap();
    orchestrator.send(GameCommand::Capture).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        GameEvent::AnalysisStateChanged { in_flight: true }
    );
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::AnalysisStateChanged { in_flight: false }
    );

    orchestrator.snapshot().await.unwrap();
    assert_eq!(detector.calls(), 1);
    assert!(events.try_recv().unwrap().is_none());

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_ignored_while_active_and_reset_restarts() {
    let mut config = create_test_config(&["cup", "bottle"]);
    config.capture.auto_capture = false;
    let mut orchestrator = create_orchestrator(config, Arc::new(MockDetector::new()));
    let mut events = subscribe(&orchestrator, vec!["round_started", "session_reset"]);

    orchestrator.start().await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        GameEvent::RoundStarted { round: 1, .. }
    ));

    orchestrator.send(GameCommand::StartGame).await.unwrap();
    orchestrator.send(GameCommand::Reset).await.unwrap();
    assert_eq!(next_event(&mut events).await, GameEvent::SessionReset);

    let snapshot = orchestrator.snapshot().await.unwrap();
    assert!(!snapshot.game_active);
    assert!(snapshot.current_round.is_none());
    assert_eq!(snapshot.round_number, 1);

    orchestrator.send(GameCommand::StartGame).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        GameEvent::RoundStarted {
            round: 1,
            target: "cup".to_string(),
            time_budget: 300,
        }
    );

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_exits_on_shutdown_request() {
    let mut config = create_test_config(&["cup"]);
    config.game.auto_start = false;
    let mut orchestrator = create_orchestrator(config, Arc::new(MockDetector::new()));

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();
    assert_eq!(
        orchestrator.get_component_state("game").await,
        Some(ComponentState::Running)
    );

    let event_bus = orchestrator.event_bus();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        event_bus
            .publish(GameEvent::ShutdownRequested {
                reason: "test".to_string(),
            })
            .await
            .unwrap();
    });

    let exit_code = orchestrator.run().await.unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(
        orchestrator.get_component_state("game").await,
        Some(ComponentState::Stopped)
    );
    assert!(orchestrator.send(GameCommand::Reset).await.is_err());
}

#[tokio::test]
async fn test_initialize_registers_components() {
    let orchestrator_config = create_test_config(&["cup"]);
    let mut orchestrator =
        create_orchestrator(orchestrator_config, Arc::new(MockDetector::new()));

    let states = orchestrator.get_all_component_states().await;
    assert!(states.is_empty());

    orchestrator.initialize().await.unwrap();

    let states = orchestrator.get_all_component_states().await;
    assert_eq!(states.get("game"), Some(&ComponentState::Stopped));
    assert!(!states.contains_key("keyboard"));
    assert!(!states.contains_key("presenter"));
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn test_game_loop_future_is_spawnable() {
    let mut orchestrator =
        create_orchestrator(create_test_config(&["cup"]), Arc::new(MockDetector::new()));
    let game_loop = orchestrator.build_game_loop().unwrap();

    let future = game_loop.run();
    assert_send(&future);
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_start_after_loop_gone_is_dropped() {
    let mut orchestrator =
        create_orchestrator(create_test_config(&["cup"]), Arc::new(MockDetector::new()));
    let mut game_loop = orchestrator.build_game_loop().unwrap();
    let (_unused, receiver) = mpsc::channel(1);
    game_loop.receiver = receiver;
    assert!(game_loop.commands.is_closed());

    game_loop.schedule(Duration::from_secs(1), Deferred::StartNewRound, 1);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(game_loop.session.current_round().is_none());
    assert!(!game_loop.session.is_active());
}
