//! Runtime-transient conditions and task completion, surfaced as messages
//! rather than `Result` errors.
use serde::{Deserialize, Serialize};

use crate::reaction::ReactionStatistics;

/// Emitted under `Local` scope whenever a task-creation attempt does not
/// result in a submitted task, or whenever a task finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub reaction_id: u64,
    pub reactor_name: String,
    pub kind: ReactionEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReactionEventKind {
    /// A `precondition` hook (Buffer/Single) rejected task creation.
    Blocked,
    /// A non-`Optional` `get` hook returned no data.
    MissingData,
    /// The task ran to completion (successfully or with a captured panic);
    /// carries the statistics record.
    Finished(ReactionStatistics),
}

/// What the scheduler calls back into to emit events/log messages that
/// originate from deep inside a worker loop, where only a process-wide
/// handle (not a borrowed `PowerPlant`) is available. Implemented by
/// `PowerPlant`.
pub trait EventSink: Send + Sync {
    fn emit_reaction_event(&self, event: ReactionEvent);
}
