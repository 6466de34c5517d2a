mod game_loop;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::GameOrchestrator;
pub use types::{ComponentState, GameCommand, ShutdownReason};
