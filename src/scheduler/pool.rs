use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::atomic::{AtomicU32, Ordering as AtomicOrdering},
};

use parking_lot::{Condvar, Mutex};

use crate::{descriptors::PoolDescriptor, reaction::ReactionTask};

/// Wraps a [`ReactionTask`] for ordering within a pool's priority queue:
/// priority descending, task id ascending among ties.
struct QueuedTask(ReactionTask);

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.ordering_key() == other.0.ordering_key()
    }
}
impl Eq for QueuedTask {}
impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.ordering_key().cmp(&other.0.ordering_key())
    }
}

/// A named thread pool: a bounded worker set sharing one local priority
/// queue. Worker threads themselves are spawned and
/// driven by [`crate::scheduler::Scheduler`]; this type only owns the
/// queue and the idle-relevant counters.
pub struct Pool {
    pub descriptor: PoolDescriptor,
    queue: Mutex<BinaryHeap<QueuedTask>>,
    not_empty: Condvar,
    /// Number of tasks currently executing on this pool's workers.
    running: AtomicU32,
}

impl Pool {
    pub fn new(descriptor: PoolDescriptor) -> Self {
        Self {
            descriptor,
            queue: Mutex::new(BinaryHeap::new()),
            not_empty: Condvar::new(),
            running: AtomicU32::new(0),
        }
    }

    pub fn enqueue(&self, task: ReactionTask) {
        self.queue.lock().push(QueuedTask(task));
        self.not_empty.notify_one();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn running(&self) -> u32 {
        self.running.load(AtomicOrdering::SeqCst)
    }

    /// A pool is idle when its queue is empty and no task is executing.
    pub fn is_idle(&self) -> bool {
        self.running() == 0 && self.is_empty()
    }

    pub fn mark_running(&self) {
        self.running.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub fn mark_finished(&self) {
        self.running.fetch_sub(1, AtomicOrdering::SeqCst);
    }

    /// Pop the highest-priority task, waiting up to `timeout` for one to
    /// arrive if the queue is currently empty. A bounded wait lets the
    /// worker loop re-check the scheduler's run-state periodically instead
    /// of blocking forever past shutdown.
    pub fn pop_wait(&self, timeout: std::time::Duration) -> Option<ReactionTask> {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            let result = self.not_empty.wait_for(&mut queue, timeout);
            if result.timed_out() && queue.is_empty() {
                return None;
            }
        }
        queue.pop().map(|q| q.0)
    }

    /// Drop every queued task without running it (forced shutdown).
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn wake_one(&self) {
        self.not_empty.notify_one();
    }

    pub fn wake_all(&self) {
        self.not_empty.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{GroupSet, RunInline};
    use crate::reaction::{Reaction, ReactionIdentifiers, TaskCreation};

    fn dummy_reaction() -> std::sync::Arc<Reaction> {
        Reaction::new(
            ReactionIdentifiers::new("r", "Trigger<X>", "cb"),
            true,
            Box::new(|_| TaskCreation::Blocked),
        )
    }

    fn task(priority: i32, reaction: &std::sync::Arc<Reaction>) -> ReactionTask {
        ReactionTask::new(
            reaction.clone(),
            priority,
            PoolDescriptor::named("p", 1),
            GroupSet::new(),
            RunInline::Neutral,
            vec![],
            false,
            Box::new(|| {}),
        )
    }

    #[test]
    fn pops_highest_priority_first() {
        let pool = Pool::new(PoolDescriptor::named("p", 1));
        let r = dummy_reaction();
        pool.enqueue(task(500, &r));
        pool.enqueue(task(750, &r));
        let first = pool.pop_wait(std::time::Duration::from_millis(10)).unwrap();
        assert_eq!(first.priority, 750);
    }

    #[test]
    fn ties_break_by_task_id_ascending() {
        let pool = Pool::new(PoolDescriptor::named("p", 1));
        let r = dummy_reaction();
        let a = task(500, &r);
        let a_id = a.id;
        pool.enqueue(a);
        pool.enqueue(task(500, &r));
        let first = pool.pop_wait(std::time::Duration::from_millis(10)).unwrap();
        assert_eq!(first.id, a_id);
    }
}
