use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc, Weak,
};

use parking_lot::Mutex;

use crate::{id::REACTION_IDS, reaction::{ReactionIdentifiers, ReactionTask}};

/// Outcome of attempting to create a task for one subscriber during an
/// emit.
pub enum TaskCreation {
    Created(ReactionTask),
    /// A `precondition` hook (e.g. `Buffer`/`Single`) vetoed creation.
    Blocked,
    /// A non-`Optional` `get` hook returned no data.
    MissingData,
}

/// A binding: identity, enable flag, active-task counter, unbind hooks, and
/// the task factory fused from a word list at bind time.
pub struct Reaction {
    pub id: u64,
    pub identifiers: ReactionIdentifiers,
    pub enabled: AtomicBool,
    pub active_tasks: AtomicU32,
    /// `false` for reactions whose topic is itself statistics, to break
    /// the obvious infinite loop.
    pub emit_stats: bool,
    unbound: AtomicBool,
    unbinders: Mutex<Vec<Box<dyn FnMut() + Send>>>,
    factory: Box<dyn Fn(bool) -> TaskCreation + Send + Sync>,
}

impl Reaction {
    pub(crate) fn new(
        identifiers: ReactionIdentifiers,
        emit_stats: bool,
        factory: Box<dyn Fn(bool) -> TaskCreation + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: REACTION_IDS.next(),
            identifiers,
            enabled: AtomicBool::new(true),
            active_tasks: AtomicU32::new(0),
            emit_stats,
            unbound: AtomicBool::new(false),
            unbinders: Mutex::new(Vec::new()),
            factory,
        })
    }

    /// Build a reaction whose factory needs to reference the reaction
    /// itself (e.g. to read `active_tasks` for a `Buffer`/`Single`
    /// precondition, or to unbind itself for `Once`). `build_factory`
    /// receives a `Weak` handle it can upgrade on every invocation,
    /// avoiding the reference cycle a strong handle would create.
    pub(crate) fn new_cyclic(
        identifiers: ReactionIdentifiers,
        emit_stats: bool,
        build_factory: impl FnOnce(Weak<Reaction>) -> Box<dyn Fn(bool) -> TaskCreation + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            id: REACTION_IDS.next(),
            identifiers,
            enabled: AtomicBool::new(true),
            active_tasks: AtomicU32::new(0),
            emit_stats,
            unbound: AtomicBool::new(false),
            unbinders: Mutex::new(Vec::new()),
            factory: build_factory(weak.clone()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst) && !self.unbound.load(Ordering::SeqCst)
    }

    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    /// Register a closure to run exactly once when this reaction is
    /// unbound; each unbinder removes the reaction from one external store.
    pub(crate) fn add_unbinder(&self, unbinder: Box<dyn FnMut() + Send>) {
        self.unbinders.lock().push(unbinder);
    }

    /// Invoke the fused factory to attempt creating a task. Once unbound, a
    /// reaction never produces a new task.
    pub fn get_task(&self, request_inline: bool) -> TaskCreation {
        if self.unbound.load(Ordering::SeqCst) {
            return TaskCreation::Blocked;
        }
        (self.factory)(request_inline)
    }

    /// Run every registered unbinder exactly once. Idempotent: a second
    /// call is a no-op.
    pub fn unbind(&self) {
        if self.unbound.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut unbinders = self.unbinders.lock();
        for unbind in unbinders.iter_mut() {
            unbind();
        }
        unbinders.clear();
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.id)
            .field("label", &self.identifiers.label)
            .field("enabled", &self.is_enabled())
            .field("active_tasks", &self.active_task_count())
            .finish()
    }
}
