use crate::detector::DetectionResult;
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    Active,
    Succeeded,
    TimedOut,
}

/// One hunt for a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub number: u32,
    pub target: String,
    pub time_remaining: u32,
    pub status: RoundStatus,
}

/// Resolution reported by the round controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Succeeded { target: String, time_remaining: u32 },
    Mismatch { target: String },
    TimedOut { target: String },
}

/// Sole owner and mutator of the current round.
///
/// `Idle -> Active -> {Succeeded, TimedOut}`; a resolved round stays readable until the
/// next `start`.
#[derive(Debug, Default)]
pub struct RoundController {
    round: Option<Round>,
}

impl RoundController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, number: u32, target: &str, budget: u32) -> Result<&Round, GameError> {
        if self.is_active() {
            return Err(GameError::invalid("start a round", self.state_name()));
        }

        debug!("Round {} started for '{}' ({}s)", number, target, budget);
        Ok(self.round.insert(Round {
            number,
            target: target.to_string(),
            time_remaining: budget,
            status: RoundStatus::Active,
        }))
    }

    /// Advance the clock by one second
    pub fn tick(&mut self) -> Result<Option<RoundEvent>, GameError> {
        let state = self.state_name();
        let round = self
            .active_mut()
            .ok_or_else(|| GameError::invalid("tick", state))?;

        round.time_remaining = round.time_remaining.saturating_sub(1);
        if round.time_remaining == 0 {
            round.status = RoundStatus::TimedOut;
            return Ok(Some(RoundEvent::TimedOut {
                target: round.target.clone(),
            }));
        }

        Ok(None)
    }

    pub fn report_detection(&mut self, result: &DetectionResult) -> Result<RoundEvent, GameError> {
        let state = self.state_name();
        let round = self
            .active_mut()
            .ok_or_else(|| GameError::invalid("report a detection", state))?;

        if result.matches_target {
            round.status = RoundStatus::Succeeded;
            Ok(RoundEvent::Succeeded {
                target: round.target.clone(),
                time_remaining: round.time_remaining,
            })
        } else {
            Ok(RoundEvent::Mismatch {
                target: round.target.clone(),
            })
        }
    }

    /// Forget the current round, whatever its state
    pub fn clear(&mut self) {
        self.round = None;
    }

    pub fn current(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn active(&self) -> Option<&Round> {
        self.round
            .as_ref()
            .filter(|round| round.status == RoundStatus::Active)
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn state_name(&self) -> &'static str {
        match self.round.as_ref().map(|round| round.status) {
            None => "idle",
            Some(RoundStatus::Active) => "a round is active",
            Some(RoundStatus::Succeeded) => "the round succeeded",
            Some(RoundStatus::TimedOut) => "the round timed out",
        }
    }

    fn active_mut(&mut self) -> Option<&mut Round> {
        self.round
            .as_mut()
            .filter(|round| round.status == RoundStatus::Active)
    }
}

/// Points for a find: the time bonus `time_remaining / divisor`, never below `floor`
pub fn score_for(time_remaining: u32, floor: u32, divisor: u32) -> u32 {
    (time_remaining / divisor.max(1)).max(floor)
}
