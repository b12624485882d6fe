use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Timing and outcome record for one [`super::ReactionTask`] execution.
/// Emitted as its own `Local` message when `Reaction::emit_stats` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionStatistics {
    pub reaction_id: u64,
    pub task_id: u64,
    pub reactor_name: String,
    pub identifier: Vec<String>,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
    /// Panic payload captured via `catch_unwind`, if the callback panicked.
    pub exception: Option<String>,
}

impl ReactionStatistics {
    pub fn new(reaction_id: u64, task_id: u64, reactor_name: String, identifier: Vec<String>) -> Self {
        Self {
            reaction_id,
            task_id,
            reactor_name,
            identifier,
            created_at: SystemTime::now(),
            started_at: None,
            finished_at: None,
            exception: None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(finish)) => finish.duration_since(start).ok(),
            _ => None,
        }
    }
}
