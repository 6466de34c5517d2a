use crate::error::GameError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::warn;

/// Chooses the next target from the remaining items
pub trait TargetPicker: Send + Sync {
    /// Return an index into `remaining`, which is never empty
    fn pick(&mut self, remaining: &[String]) -> usize;
}

/// Uniform draw over the remaining items, independent of earlier draws
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetPicker for RandomPicker {
    fn pick(&mut self, remaining: &[String]) -> usize {
        self.rng.gen_range(0..remaining.len())
    }
}

/// Always the first remaining item, in pool order
#[derive(Debug, Default)]
pub struct SequentialPicker;

impl TargetPicker for SequentialPicker {
    fn pick(&mut self, _remaining: &[String]) -> usize {
        0
    }
}

/// The session's item labels, partitioned into remaining, completed and timed out.
///
/// The three lists are pairwise disjoint and together always equal the original pool.
#[derive(Debug, Clone)]
pub struct ItemPool {
    all: Vec<String>,
    remaining: Vec<String>,
    completed: Vec<String>,
    timed_out: Vec<String>,
}

impl ItemPool {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for item in items {
            let item = item.into();
            if seen.insert(item.clone()) {
                all.push(item);
            } else {
                warn!("Ignoring duplicate item '{}'", item);
            }
        }

        Self {
            remaining: all.clone(),
            all,
            completed: Vec::new(),
            timed_out: Vec::new(),
        }
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn timed_out(&self) -> &[String] {
        &self.timed_out
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn contains_remaining(&self, item: &str) -> bool {
        self.remaining.iter().any(|i| i == item)
    }

    /// Draw the next target without removing it
    pub fn pick(&self, picker: &mut dyn TargetPicker) -> Option<&str> {
        if self.remaining.is_empty() {
            return None;
        }
        let index = picker.pick(&self.remaining).min(self.remaining.len() - 1);
        Some(&self.remaining[index])
    }

    /// Move a found item to the completed list
    pub fn complete(&mut self, item: &str) -> Result<(), GameError> {
        self.take(item)?;
        self.completed.push(item.to_string());
        Ok(())
    }

    /// Remove an item that ran out of time
    pub fn time_out(&mut self, item: &str) -> Result<(), GameError> {
        self.take(item)?;
        self.timed_out.push(item.to_string());
        Ok(())
    }

    /// Put every item back into the remaining list
    pub fn restore(&mut self) {
        self.remaining = self.all.clone();
        self.completed.clear();
        self.timed_out.clear();
    }

    fn take(&mut self, item: &str) -> Result<(), GameError> {
        let index = self
            .remaining
            .iter()
            .position(|i| i == item)
            .ok_or_else(|| GameError::UnknownItem {
                item: item.to_string(),
            })?;
        self.remaining.remove(index);
        Ok(())
    }
}
