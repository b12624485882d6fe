use std::sync::Arc;

use crate::reaction::Reaction;

/// One registered idle handler: fires when its target pool (or every
/// `counts_for_idle` pool if unfiltered) has no runnable work and its
/// reaction has no active task.
///
/// No separate "already fired" flag is needed: the active-task-count
/// condition already suppresses re-firing until the previously created
/// task completes, since creating a task increments
/// `reaction.active_tasks` before the task is even enqueued.
pub struct IdleTaskEntry {
    pub id: u64,
    pub reaction: Arc<Reaction>,
    pub pool_filter: Option<String>,
}

impl IdleTaskEntry {
    pub fn ready_to_fire(&self) -> bool {
        self.reaction.active_task_count() == 0
    }
}
