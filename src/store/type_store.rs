use std::sync::Arc;

use parking_lot::RwLock;

use super::{peek_override, Shared};
use crate::reaction::Reaction;

/// Opaque handle returned by [`TypeStore::subscribe`]; used by the
/// reaction's unbinder closure to remove itself again.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionToken(pub(crate) u64);

/// Per-message-type last-value cache and subscriber list.
///
/// `latest` is a single-writer-wins atomic replace: readers hold their own
/// `Arc` clone, so an overwrite never invalidates a snapshot already taken.
pub struct TypeStore<M> {
    latest: RwLock<Option<Shared<M>>>,
    subscribers: RwLock<Arc<Vec<Arc<Reaction>>>>,
}

impl<M> Default for TypeStore<M> {
    fn default() -> Self {
        Self {
            latest: RwLock::new(None),
            subscribers: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

impl<M: 'static> TypeStore<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest value. Prior readers keep whatever snapshot they
    /// already hold.
    pub fn set(&self, value: Shared<M>) {
        *self.latest.write() = Some(value);
    }

    /// Read the current value, honouring any thread-local current-value
    /// override installed by an in-flight emit of this type on this thread.
    pub fn get(&self) -> Option<Shared<M>> {
        if let Some(overridden) = peek_override::<M>() {
            return overridden;
        }
        self.latest.read().clone()
    }

    /// Append a subscriber; insertion order is preserved. Returns a token
    /// identifying this specific subscription (the reaction id, since a
    /// reaction may only subscribe once per type in practice but the token
    /// keeps removal unambiguous).
    pub fn subscribe(&self, reaction: Arc<Reaction>) -> SubscriptionToken {
        let token = SubscriptionToken(reaction.id);
        let mut subs = self.subscribers.write();
        let mut next = (**subs).clone();
        next.push(reaction);
        *subs = Arc::new(next);
        token
    }

    /// Remove a subscriber by reaction id. O(n); unbinding is rare relative
    /// to dispatch.
    pub fn unsubscribe(&self, reaction_id: u64) {
        let mut subs = self.subscribers.write();
        if subs.iter().any(|r| r.id == reaction_id) {
            let next: Vec<_> =
                subs.iter().filter(|r| r.id != reaction_id).cloned().collect();
            *subs = Arc::new(next);
        }
    }

    /// A cheap snapshot of the current subscriber list. Safe to iterate
    /// while another thread concurrently subscribes/unsubscribes, because
    /// the snapshot is an independent `Arc` taken under the store's lock.
    pub fn subscribers(&self) -> Arc<Vec<Arc<Reaction>>> {
        self.subscribers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store: TypeStore<u32> = TypeStore::new();
        store.set(Arc::new(42));
        assert_eq!(*store.get().unwrap(), 42);
    }

    #[test]
    fn get_is_none_before_any_set() {
        let store: TypeStore<u32> = TypeStore::new();
        assert!(store.get().is_none());
    }

    #[test]
    fn stale_snapshot_survives_overwrite() {
        let store: TypeStore<u32> = TypeStore::new();
        store.set(Arc::new(1));
        let snapshot = store.get().unwrap();
        store.set(Arc::new(2));
        assert_eq!(*snapshot, 1);
        assert_eq!(*store.get().unwrap(), 2);
    }
}
