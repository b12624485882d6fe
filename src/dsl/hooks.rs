use crate::descriptors::{GroupDescriptor, GroupSet, PoolDescriptor, Priority, RunInline};

/// Resolved configuration assembled from the non-binding DSL words
/// (`Priority`, `Pool<P>`, `Group<G, N>`/`Sync<G>`, `Inline`,
/// `Buffer<N>`/`Single`) before a reaction's task factory is built
///. The binding words (`Trigger<T>`, `Startup`,
/// `Shutdown`, `Every`, `Watchdog`) are handled separately by the
/// `Reactor::on_*` entry point that requires one, since a reaction
/// structurally cannot be built without exactly one of them.
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    pub priority: Option<i32>,
    pub pool: Option<PoolDescriptor>,
    pub groups: GroupSet,
    pub run_inline: RunInline,
    pub buffer_limit: Option<u32>,
    /// `Once`: unbind the reaction after its single task finishes. Implies
    /// `Single` semantics (`buffer_limit = Some(1)`).
    pub once: bool,
}

impl HookSet {
    /// Merge rules: groups union; run_inline via `Neutral` yields,
    /// `Always`/`Never` conflict is fatal; priority/pool last-writer-wins
    /// by fold position (`other` is later in the list).
    pub fn merge(mut self, other: HookSet) -> Result<HookSet, ()> {
        // Union by group id, not by the full descriptor: a group's token
        // count is fixed at its first use, so a later fragment naming the
        // same id must not add a second, differently-counted entry.
        for g in other.groups {
            if !self.groups.iter().any(|existing| existing.id == g.id) {
                self.groups.insert(g);
            }
        }
        self.run_inline = self.run_inline.merge(other.run_inline)?;
        if other.priority.is_some() {
            self.priority = other.priority;
        }
        if other.pool.is_some() {
            self.pool = other.pool;
        }
        if other.buffer_limit.is_some() {
            self.buffer_limit = other.buffer_limit;
        }
        self.once = self.once || other.once;
        Ok(self)
    }

    pub fn resolved_priority(&self) -> i32 {
        self.priority.unwrap_or(Priority::NORMAL)
    }
}

/// Folds a list of data-only word fragments into one `HookSet`,
/// surfacing the `Always`/`Never` conflict as a `ConfigurationError` at
/// the caller (the fused-closure builder in `reactor_base`).
pub struct HookSetBuilder {
    current: HookSet,
}

impl HookSetBuilder {
    pub fn new() -> Self {
        Self { current: HookSet::default() }
    }

    pub fn add(mut self, fragment: HookSet) -> Result<Self, ()> {
        self.current = self.current.merge(fragment)?;
        Ok(self)
    }

    pub fn build(self) -> HookSet {
        self.current
    }
}

impl Default for HookSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A named thread pool identified by type, the way the original DSL uses
/// `Pool<P>`. `MainThread` is the reserved implementor bound to the
/// thread that calls `PowerPlant::start`.
pub trait PoolId {
    const NAME: &'static str;
    const CONCURRENCY: u32;
}

pub struct MainThread;
impl PoolId for MainThread {
    const NAME: &'static str = PoolDescriptor::MAIN_THREAD_ID;
    const CONCURRENCY: u32 = 1;
}

/// A mutual-exclusion group identified by type, the way the original DSL
/// uses `Group<G>`/`Sync<G>`.
pub trait GroupId {
    const NAME: &'static str;
}

/// `pool: (task) -> PoolDescriptor` hook for `Pool<P>`.
pub fn pool<P: PoolId>() -> HookSet {
    HookSet {
        pool: Some(PoolDescriptor::named(P::NAME, P::CONCURRENCY)),
        ..Default::default()
    }
}

/// `group: (task) -> set<GroupDescriptor>` hook for `Group<G, N>`.
pub fn group<G: GroupId, const N: u32>() -> HookSet {
    let mut groups = GroupSet::new();
    groups.insert(GroupDescriptor::new(G::NAME, N));
    HookSet { groups, ..Default::default() }
}

/// `Sync<G>`: `Group<G, 1>`.
pub fn sync<G: GroupId>() -> HookSet {
    group::<G, 1>()
}

/// `priority: (task) -> i32` hook.
pub fn priority(value: i32) -> HookSet {
    HookSet { priority: Some(value), ..Default::default() }
}

/// `run_inline` hook for `Inline`: forces direct execution.
pub fn inline() -> HookSet {
    HookSet { run_inline: RunInline::Always, ..Default::default() }
}

/// `precondition: (task) -> bool` hook for `Buffer<N>`: `active_tasks < N`.
pub fn buffer(limit: u32) -> HookSet {
    HookSet { buffer_limit: Some(limit.max(1)), ..Default::default() }
}

/// `Single`: `Buffer<1>`.
pub fn single() -> HookSet {
    buffer(1)
}

/// `Once`: `Single` plus self-unbind after the one task finishes.
pub fn once() -> HookSet {
    HookSet { once: true, ..buffer(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGroup;
    impl GroupId for TestGroup {
        const NAME: &'static str = "test-group";
    }

    #[test]
    fn fragments_compose_with_last_writer_wins_priority() {
        let hooks = HookSetBuilder::new()
            .add(priority(100))
            .unwrap()
            .add(single())
            .unwrap()
            .add(priority(200))
            .unwrap()
            .build();
        assert_eq!(hooks.resolved_priority(), 200);
        assert_eq!(hooks.buffer_limit, Some(1));
    }

    #[test]
    fn groups_union_across_fragments() {
        let hooks = HookSetBuilder::new()
            .add(sync::<TestGroup>())
            .unwrap()
            .add(group::<TestGroup, 4>())
            .unwrap()
            .build();
        // Same group id referenced twice: the set keeps one entry, the
        // later fragment's token count (BTreeSet ordered by the whole
        // descriptor, so this asserts on membership by id instead).
        assert!(hooks.groups.iter().any(|g| g.id == "test-group"));
    }

    #[test]
    fn always_never_conflict_is_an_error() {
        let conflict = HookSetBuilder::new().add(inline()).unwrap().add(HookSet {
            run_inline: RunInline::Never,
            ..Default::default()
        });
        assert!(conflict.is_err());
    }
}
