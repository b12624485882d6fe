//! Small value types shared between the DSL, reactions/tasks, and the
//! scheduler: pool/group descriptors and the run-inline tri-state.
use std::collections::BTreeSet;

/// Identifies a named thread pool. Deduped by `id`: two descriptors with
/// the same id are the same pool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolDescriptor {
    pub id: String,
    pub concurrency: u32,
    pub counts_for_idle: bool,
}

impl PoolDescriptor {
    pub const DEFAULT_ID: &'static str = "default";
    pub const MAIN_THREAD_ID: &'static str = "main";

    pub fn named(id: impl Into<String>, concurrency: u32) -> Self {
        Self {
            id: id.into(),
            concurrency,
            counts_for_idle: true,
        }
    }

    /// `MainThread`: a reserved single-thread pool bound to the thread that
    /// calls `Scheduler::start`.
    pub fn main_thread() -> Self {
        Self {
            id: Self::MAIN_THREAD_ID.to_string(),
            concurrency: 1,
            counts_for_idle: true,
        }
    }
}

/// Identifies a mutual-exclusion group. Token count is fixed at the point
/// of first use (the scheduler never changes it after the group is
/// created).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupDescriptor {
    pub id: String,
    pub token_count: u32,
}

impl GroupDescriptor {
    pub fn new(id: impl Into<String>, token_count: u32) -> Self {
        Self {
            id: id.into(),
            token_count: token_count.max(1),
        }
    }
}

/// Resolved set of groups a task must hold tokens from before it runs.
/// Sorted by id so acquisition order is stable across tasks and deadlock
/// from circular wait cannot occur.
pub type GroupSet = BTreeSet<GroupDescriptor>;

/// Whether a task must/must-not/may run inline on the emitting thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunInline {
    Always,
    Never,
    #[default]
    Neutral,
}

impl RunInline {
    /// Merge rule from the DSL composer: `Neutral` yields to the other
    /// value; `Always` combined with `Never` is a fatal configuration
    /// error, surfaced by the caller as `Err`.
    pub fn merge(self, other: RunInline) -> Result<RunInline, ()> {
        use RunInline::*;
        Ok(match (self, other) {
            (Neutral, x) | (x, Neutral) => x,
            (Always, Always) => Always,
            (Never, Never) => Never,
            (Always, Never) | (Never, Always) => return Err(()),
        })
    }
}

/// Built-in priority constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority;

impl Priority {
    pub const REALTIME: i32 = 1000;
    pub const HIGH: i32 = 750;
    pub const NORMAL: i32 = 500;
    pub const LOW: i32 = 250;
    pub const IDLE: i32 = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_inline_merge_rules() {
        assert_eq!(RunInline::Neutral.merge(RunInline::Always), Ok(RunInline::Always));
        assert_eq!(RunInline::Always.merge(RunInline::Neutral), Ok(RunInline::Always));
        assert_eq!(RunInline::Always.merge(RunInline::Always), Ok(RunInline::Always));
        assert!(RunInline::Always.merge(RunInline::Never).is_err());
    }
}
