//! Monotonic unique identifiers for reactions and tasks.
use std::sync::atomic::{AtomicU64, Ordering};

/// A process-wide monotonic counter. Reactions and reaction tasks each own
/// one of these so that ids never collide and ordering by id matches
/// creation order.
#[derive(Debug)]
pub struct IdGen(AtomicU64);

impl IdGen {
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Allocate the next id. Ids start at 1; 0 is reserved as "no id".
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Global id generator for [`crate::reaction::Reaction`] ids.
pub static REACTION_IDS: IdGen = IdGen::new();
/// Global id generator for [`crate::reaction::ReactionTask`] ids.
pub static TASK_IDS: IdGen = IdGen::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let gen = IdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert!(b > a);
    }
}
