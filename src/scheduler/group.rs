use std::{collections::HashMap, sync::Arc};

use parking_lot::{Condvar, Mutex, RwLock};

use crate::descriptors::{GroupDescriptor, GroupSet};

/// A counting-semaphore abstraction enforcing at most `token_count`
/// concurrent tasks sharing a key. Modelled on `io_engine::core::lock`'s
/// per-subsystem mutex design, adapted from an async mutex to a blocking
/// counting semaphore since the scheduler's workers are plain OS threads.
pub struct Group {
    pub descriptor: GroupDescriptor,
    available: Mutex<u32>,
    condvar: Condvar,
}

impl Group {
    fn new(descriptor: GroupDescriptor) -> Self {
        let tokens = descriptor.token_count;
        Self {
            descriptor,
            available: Mutex::new(tokens),
            condvar: Condvar::new(),
        }
    }

    /// Block the current thread until a token is available, then take it.
    pub fn acquire_blocking(&self) {
        let mut available = self.available.lock();
        while *available == 0 {
            self.condvar.wait(&mut available);
        }
        *available -= 1;
    }

    /// Take a token only if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock();
        if *available > 0 {
            *available -= 1;
            true
        } else {
            false
        }
    }

    pub fn release(&self) {
        let mut available = self.available.lock();
        *available += 1;
        self.condvar.notify_one();
    }
}

/// Registry of groups, keyed by `GroupDescriptor::id`. Groups are added
/// lazily on first reference; the token count is fixed at that point.
#[derive(Default)]
pub struct GroupManager {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create(&self, descriptor: &GroupDescriptor) -> Arc<Group> {
        if let Some(existing) = self.groups.read().get(&descriptor.id) {
            return existing.clone();
        }
        self.groups
            .write()
            .entry(descriptor.id.clone())
            .or_insert_with(|| Arc::new(Group::new(descriptor.clone())))
            .clone()
    }

    /// Acquire every group's token, blocking as needed. Groups are sorted
    /// by id (the caller passes a `GroupSet`, a `BTreeSet`) so acquisition
    /// order is stable across all tasks and circular wait cannot occur.
    /// Returns a guard releasing tokens in reverse order on drop.
    pub fn acquire_all_blocking(&self, groups: &GroupSet) -> GroupTokens {
        let mut held = Vec::with_capacity(groups.len());
        for descriptor in groups {
            let group = self.get_or_create(descriptor);
            group.acquire_blocking();
            held.push(group);
        }
        GroupTokens { held }
    }

    /// Attempt to acquire every group's token without blocking. On the
    /// first unavailable token, release everything already taken (in
    /// reverse order) and return `None` — the inline-execution fallback
    /// path this exists for must never block.
    pub fn try_acquire_all(&self, groups: &GroupSet) -> Option<GroupTokens> {
        let mut held = Vec::with_capacity(groups.len());
        for descriptor in groups {
            let group = self.get_or_create(descriptor);
            if group.try_acquire() {
                held.push(group);
            } else {
                for g in held.into_iter().rev() {
                    g.release();
                }
                return None;
            }
        }
        Some(GroupTokens { held })
    }
}

/// RAII guard over a set of acquired group tokens. Released in reverse
/// acquisition order on drop.
pub struct GroupTokens {
    held: Vec<Arc<Group>>,
}

impl Drop for GroupTokens {
    fn drop(&mut self) {
        for group in self.held.drain(..).rev() {
            group.release();
        }
    }
}
