use std::sync::{atomic::Ordering, Arc};

use crate::reaction::Reaction;

/// User-facing handle returned by a reactor's `on<...>` binding call.
/// Supports enable/disable/enabled/unbind.
#[derive(Clone)]
pub struct ReactionHandle {
    reaction: Arc<Reaction>,
}

impl ReactionHandle {
    pub(crate) fn new(reaction: Arc<Reaction>) -> Self {
        Self { reaction }
    }

    pub fn id(&self) -> u64 {
        self.reaction.id
    }

    pub fn enable(&self) {
        self.reaction.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.reaction.enabled.store(false, Ordering::SeqCst);
    }

    pub fn enabled(&self) -> bool {
        self.reaction.is_enabled()
    }

    /// Unbind the reaction from every store it registered with. Idempotent.
    pub fn unbind(&self) {
        self.reaction.unbind();
    }

    pub(crate) fn reaction(&self) -> &Arc<Reaction> {
        &self.reaction
    }
}

impl std::fmt::Debug for ReactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.reaction.fmt(f)
    }
}
