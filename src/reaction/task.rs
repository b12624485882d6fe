use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{atomic::Ordering, Arc},
    time::SystemTime,
};

use crate::{
    descriptors::{GroupSet, PoolDescriptor, RunInline},
    id::TASK_IDS,
    reaction::{Reaction, ReactionStatistics},
};

/// One scheduled execution of a [`Reaction`] with its data snapshot already
/// captured. Created by a reaction's factory inside an emit call; destroyed
/// after `callback` returns, which decrements `parent.active_tasks`.
pub struct ReactionTask {
    pub id: u64,
    pub parent: Arc<Reaction>,
    pub priority: i32,
    pub pool: PoolDescriptor,
    pub groups: GroupSet,
    pub run_inline: RunInline,
    pub statistics: Option<ReactionStatistics>,
    callback: Option<Box<dyn FnOnce() + Send>>,
}

/// What happened when a [`ReactionTask`] was run.
pub struct TaskOutcome {
    pub statistics: Option<ReactionStatistics>,
}

impl ReactionTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        parent: Arc<Reaction>,
        priority: i32,
        pool: PoolDescriptor,
        groups: GroupSet,
        run_inline: RunInline,
        identifier: Vec<String>,
        record_statistics: bool,
        callback: Box<dyn FnOnce() + Send>,
    ) -> Self {
        let id = TASK_IDS.next();
        let statistics = record_statistics.then(|| {
            ReactionStatistics::new(parent.id, id, parent.identifiers.reactor_name.clone(), identifier)
        });
        parent.active_tasks.fetch_add(1, Ordering::SeqCst);
        Self {
            id,
            parent,
            priority,
            pool,
            groups,
            run_inline,
            statistics,
            callback: Some(callback),
        }
    }

    /// Ordering key used by pools: priority descending, then task id
    /// ascending among ties.
    pub fn ordering_key(&self) -> (i32, std::cmp::Reverse<u64>) {
        (self.priority, std::cmp::Reverse(self.id))
    }

    /// Execute the callback, catching any panic so a misbehaving reaction
    /// never takes down a worker thread. Consumes `self`; dropping the
    /// returned value (nothing to hold) releases the task's slot in
    /// `parent.active_tasks` via `Drop`.
    pub fn run(mut self) -> TaskOutcome {
        let mut statistics = self.statistics.take();
        if let Some(stats) = statistics.as_mut() {
            stats.started_at = Some(SystemTime::now());
        }

        let callback = self.callback.take().expect("task run more than once");
        let result = catch_unwind(AssertUnwindSafe(callback));

        if let Some(stats) = statistics.as_mut() {
            stats.finished_at = Some(SystemTime::now());
            if let Err(panic) = result {
                stats.exception = Some(panic_message(&panic));
            }
        }

        TaskOutcome { statistics }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "reaction callback panicked with a non-string payload".to_string()
    }
}

impl Drop for ReactionTask {
    fn drop(&mut self) {
        self.parent.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ReactionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionTask")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("pool", &self.pool.id)
            .finish()
    }
}
