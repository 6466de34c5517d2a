use crate::events::GameEvent;
use std::time::Duration;

/// Work the session asks to run later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    StartNewRound,
}

/// Side effects returned by session transitions, executed by the game loop
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Publish to the presentation layer
    Emit(GameEvent),
    /// Feed `action` back into the session after `delay`.
    ///
    /// `generation` must still match when it fires, otherwise the action is stale.
    Schedule {
        delay: Duration,
        action: Deferred,
        generation: u64,
    },
}

impl Effect {
    pub fn emitted(&self) -> Option<&GameEvent> {
        match self {
            Effect::Emit(event) => Some(event),
            Effect::Schedule { .. } => None,
        }
    }
}
