use super::effects::{Deferred, Effect};
use super::pool::{ItemPool, RandomPicker, TargetPicker};
use super::round::{score_for, Round, RoundController, RoundEvent};
use crate::config::GameConfig;
use crate::detector::{Detection, DetectionResult};
use crate::error::GameError;
use crate::events::GameEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Timing and scoring rules for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    pub round_seconds: u32,
    pub score_floor: u32,
    pub score_divisor: u32,
    pub settle_delay: Duration,
    pub timeout_delay: Duration,
}

impl From<&GameConfig> for SessionRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            round_seconds: config.round_seconds,
            score_floor: config.score_floor,
            score_divisor: config.score_divisor,
            settle_delay: config.settle_delay(),
            timeout_delay: config.timeout_delay(),
        }
    }
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

/// Identifies the round a capture was taken for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTicket {
    pub round: u32,
    pub target: String,
}

/// Read-only view of the session for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub score: u32,
    pub round_number: u32,
    pub game_active: bool,
    pub game_completed: bool,
    pub current_round: Option<Round>,
    pub remaining_items: Vec<String>,
    pub completed_items: Vec<String>,
    pub timed_out_items: Vec<String>,
    pub last_detections: Vec<Detection>,
    pub last_analysis: Option<DateTime<Utc>>,
}

/// Owns the item pool, the round controller, and the session score.
///
/// Every transition returns the [`Effect`]s it produced; nothing here touches timers
/// or the event bus directly.
pub struct SessionController {
    id: Uuid,
    rules: SessionRules,
    pool: ItemPool,
    rounds: RoundController,
    picker: Box<dyn TargetPicker>,
    score: u32,
    round_number: u32,
    game_active: bool,
    game_completed: bool,
    generation: u64,
    last_detections: Vec<Detection>,
    last_analysis: Option<DateTime<Utc>>,
}

impl SessionController {
    pub fn new(pool: ItemPool, rules: SessionRules) -> Self {
        Self::with_picker(pool, rules, Box::new(RandomPicker::new()))
    }

    pub fn with_picker(pool: ItemPool, rules: SessionRules, picker: Box<dyn TargetPicker>) -> Self {
        let id = Uuid::new_v4();
        info!("Session {} created with {} items", id, pool.all().len());

        Self {
            id,
            rules,
            pool,
            rounds: RoundController::new(),
            picker,
            score: 0,
            round_number: 1,
            game_active: false,
            game_completed: false,
            generation: 0,
            last_detections: Vec::new(),
            last_analysis: None,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(ItemPool::new(config.items.iter().cloned()), SessionRules::from(config))
    }

    /// Begin hunting a fresh target, or complete the game if the pool is exhausted
    pub fn start_new_round(&mut self) -> Result<Vec<Effect>, GameError> {
        if self.rounds.is_active() {
            return Err(GameError::invalid("start a new round", self.rounds.state_name()));
        }

        self.generation += 1;

        let Some(target) = self.pool.pick(self.picker.as_mut()).map(str::to_string) else {
            return Ok(self.complete_game());
        };

        let number = self.round_number;
        self.rounds.start(number, &target, self.rules.round_seconds)?;
        self.round_number += 1;
        self.game_active = true;
        self.last_detections.clear();

        info!("Round {} started: find '{}'", number, target);

        Ok(vec![Effect::Emit(GameEvent::RoundStarted {
            round: number,
            target,
            time_budget: self.rules.round_seconds,
        })])
    }

    /// Advance the active round clock by one second; a no-op between rounds
    pub fn tick(&mut self) -> Result<Vec<Effect>, GameError> {
        if !self.rounds.is_active() {
            return Ok(Vec::new());
        }

        let resolution = self.rounds.tick()?;
        let mut effects = Vec::new();

        if let Some(round) = self.rounds.current() {
            effects.push(Effect::Emit(GameEvent::TimeChanged {
                target: round.target.clone(),
                time_remaining: round.time_remaining,
            }));
        }

        if let Some(RoundEvent::TimedOut { target }) = resolution {
            effects.extend(self.on_round_timed_out(target)?);
        }

        Ok(effects)
    }

    /// Apply a detector outcome captured for `ticket`.
    ///
    /// Reports for a round that is no longer active are discarded.
    pub fn report_detection(
        &mut self,
        ticket: &RoundTicket,
        result: DetectionResult,
    ) -> Result<Vec<Effect>, GameError> {
        match self.rounds.active() {
            Some(round) if round.number == ticket.round && round.target == ticket.target => {}
            _ => {
                debug!(
                    "Discarding detection for round {} ('{}'): round no longer active",
                    ticket.round, ticket.target
                );
                return Ok(Vec::new());
            }
        }

        if !result.succeeded {
            debug!("Detector call failed, round continues");
            return Ok(Vec::new());
        }

        self.last_analysis = Some(Utc::now());
        self.last_detections = result.matches.clone();

        match self.rounds.report_detection(&result)? {
            RoundEvent::Succeeded {
                target,
                time_remaining,
            } => self.on_round_succeeded(target, time_remaining, result.matches),
            RoundEvent::Mismatch { target } => {
                debug!("'{}' not in frame ({} detections)", target, result.matches.len());
                Ok(vec![Effect::Emit(GameEvent::RoundMismatch {
                    target,
                    detections: result.matches,
                })])
            }
            RoundEvent::TimedOut { target } => self.on_round_timed_out(target),
        }
    }

    /// Execute an action scheduled earlier, unless a start or reset has made it stale
    pub fn run_deferred(&mut self, action: Deferred, generation: u64) -> Result<Vec<Effect>, GameError> {
        if generation != self.generation {
            debug!(
                "Dropping stale {:?} (generation {}, current {})",
                action, generation, self.generation
            );
            return Ok(Vec::new());
        }

        match action {
            Deferred::StartNewRound if self.rounds.is_active() => Ok(Vec::new()),
            Deferred::StartNewRound => self.start_new_round(),
        }
    }

    /// Restore the initial state; waits for an explicit start afterwards
    pub fn reset(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.pool.restore();
        self.rounds.clear();
        self.score = 0;
        self.round_number = 1;
        self.game_active = false;
        self.game_completed = false;
        self.last_detections.clear();
        self.last_analysis = None;

        info!("Session {} reset", self.id);

        vec![
            Effect::Emit(GameEvent::SessionReset),
            Effect::Emit(GameEvent::ScoreChanged { score: 0 }),
        ]
    }

    /// The capture context for the active round, if any
    pub fn current_ticket(&self) -> Option<RoundTicket> {
        self.rounds.active().map(|round| RoundTicket {
            round: round.number,
            target: round.target.clone(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn is_active(&self) -> bool {
        self.game_active
    }

    pub fn is_round_active(&self) -> bool {
        self.rounds.is_active()
    }

    pub fn is_completed(&self) -> bool {
        self.game_completed
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.current()
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            score: self.score,
            round_number: self.round_number,
            game_active: self.game_active,
            game_completed: self.game_completed,
            current_round: self.rounds.current().cloned(),
            remaining_items: self.pool.remaining().to_vec(),
            completed_items: self.pool.completed().to_vec(),
            timed_out_items: self.pool.timed_out().to_vec(),
            last_detections: self.last_detections.clone(),
            last_analysis: self.last_analysis,
        }
    }

    fn on_round_succeeded(
        &mut self,
        target: String,
        time_remaining: u32,
        detections: Vec<Detection>,
    ) -> Result<Vec<Effect>, GameError> {
        self.pool.complete(&target)?;
        self.game_active = false;

        let points = score_for(time_remaining, self.rules.score_floor, self.rules.score_divisor);
        self.score += points;

        info!(
            "Found '{}' with {}s left: +{} points (score {})",
            target, time_remaining, points, self.score
        );

        Ok(vec![
            Effect::Emit(GameEvent::RoundSucceeded {
                target,
                time_remaining,
                points,
                detections,
            }),
            Effect::Emit(GameEvent::ScoreChanged { score: self.score }),
            self.schedule_next(self.rules.settle_delay),
        ])
    }

    fn on_round_timed_out(&mut self, target: String) -> Result<Vec<Effect>, GameError> {
        self.pool.time_out(&target)?;
        self.game_active = false;

        info!("Time ran out for '{}'", target);

        Ok(vec![
            Effect::Emit(GameEvent::RoundTimedOut { target }),
            self.schedule_next(self.rules.timeout_delay),
        ])
    }

    fn schedule_next(&self, delay: Duration) -> Effect {
        Effect::Schedule {
            delay,
            action: Deferred::StartNewRound,
            generation: self.generation,
        }
    }

    fn complete_game(&mut self) -> Vec<Effect> {
        self.game_active = false;
        if self.game_completed {
            return Vec::new();
        }
        self.game_completed = true;

        info!(
            "Game complete: score {}, {} found, {} timed out",
            self.score,
            self.pool.completed().len(),
            self.pool.timed_out().len()
        );

        vec![Effect::Emit(GameEvent::GameCompleted {
            score: self.score,
            completed: self.pool.completed().to_vec(),
            timed_out: self.pool.timed_out().to_vec(),
        })]
    }
}
