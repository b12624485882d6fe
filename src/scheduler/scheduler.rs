use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::Duration,
};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::{
    descriptors::{PoolDescriptor, RunInline},
    error::{ConfigResult, ConfigurationError},
    events::{EventSink, ReactionEvent, ReactionEventKind},
    reaction::{Reaction, ReactionTask, TaskCreation, TaskOutcome},
    scheduler::{group::GroupManager, idle::IdleTaskEntry, pool::Pool},
};

/// Worker-loop polling granularity: how long a worker waits on an empty
/// queue before re-checking the run-state. Small enough that shutdown
/// latency is negligible, large enough to avoid busy-waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Created = 0,
    Running = 1,
    ShuttingDown = 2,
    Terminated = 3,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunState::Created,
            1 => RunState::Running,
            2 => RunState::ShuttingDown,
            _ => RunState::Terminated,
        }
    }
}

/// Owns all pools and groups; routes submissions; orchestrates the
/// mechanics of startup/shutdown. A cheap `Arc` clone
/// handle; every worker thread holds one.
#[derive(Clone)]
pub struct Scheduler(Arc<Inner>);

struct Inner {
    pools: RwLock<HashMap<String, Arc<Pool>>>,
    groups: GroupManager,
    idle_tasks: RwLock<Vec<IdleTaskEntry>>,
    idle_id_gen: AtomicU64,
    state: AtomicU8,
    default_pool_concurrency: u32,
    sink: OnceCell<Arc<dyn EventSink>>,
    worker_threads: RwLock<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(default_pool_concurrency: u32) -> Self {
        Scheduler(Arc::new(Inner {
            pools: RwLock::new(HashMap::new()),
            groups: GroupManager::new(),
            idle_tasks: RwLock::new(Vec::new()),
            idle_id_gen: AtomicU64::new(1),
            state: AtomicU8::new(RunState::Created as u8),
            default_pool_concurrency,
            sink: OnceCell::new(),
            worker_threads: RwLock::new(Vec::new()),
        }))
    }

    /// Wire up the event sink (the owning `PowerPlant`). Must be called
    /// before `start`; the scheduler itself never emits before then.
    pub fn set_sink(&self, sink: Arc<dyn EventSink>) {
        let _ = self.0.sink.set(sink);
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.0.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: RunState) {
        self.0.state.store(state as u8, Ordering::SeqCst);
    }

    fn default_pool(&self) -> PoolDescriptor {
        PoolDescriptor::named(PoolDescriptor::DEFAULT_ID, self.0.default_pool_concurrency)
    }

    /// Resolve a task's pool descriptor, substituting the default pool
    /// descriptor's concurrency when a caller only named a pool by id
    /// without specifying concurrency.
    pub fn resolve_pool(&self, descriptor: Option<PoolDescriptor>) -> PoolDescriptor {
        descriptor.unwrap_or_else(|| self.default_pool())
    }

    fn get_or_create_pool(&self, descriptor: PoolDescriptor) -> Arc<Pool> {
        if let Some(existing) = self.0.pools.read().get(&descriptor.id) {
            return existing.clone();
        }
        let mut pools = self.0.pools.write();
        let is_new = !pools.contains_key(&descriptor.id);
        let pool = pools
            .entry(descriptor.id.clone())
            .or_insert_with(|| Arc::new(Pool::new(descriptor.clone())))
            .clone();
        drop(pools);

        // If the scheduler is already past Created, a pool referenced for
        // the first time needs its workers spawned right now; pools known
        // before `start()` get theirs spawned there instead.
        if is_new && descriptor.id != PoolDescriptor::MAIN_THREAD_ID && self.state() != RunState::Created
        {
            self.spawn_workers_for(&pool);
        }
        pool
    }

    fn spawn_workers_for(&self, pool: &Arc<Pool>) {
        for _ in 0..pool.descriptor.concurrency.max(1) {
            let scheduler = self.clone();
            let pool = pool.clone();
            let handle = std::thread::Builder::new()
                .name(format!("nuclear-{}", pool.descriptor.id))
                .spawn(move || scheduler.run_worker(pool))
                .expect("failed to spawn scheduler worker thread");
            self.0.worker_threads.write().push(handle);
        }
    }

    /// Submission algorithm for one task. Plain `Local`
    /// emits never request inline execution; only a reaction whose own
    /// `run_inline` hook resolved to `Always` can still run inline here.
    pub fn submit(&self, task: ReactionTask) {
        self.submit_inner(false, task)
    }

    /// Submit with an explicit `request_inline` flag, used by `Inline`-scope
    /// emits where the factory was asked to prefer direct execution.
    pub fn submit_requesting_inline(&self, task: ReactionTask, request_inline: bool) {
        self.submit_inner(request_inline, task)
    }

    fn submit_inner(&self, request_inline: bool, task: ReactionTask) {
        if self.state() == RunState::Terminated {
            return;
        }

        let want_inline =
            task.run_inline == RunInline::Always || (request_inline && task.run_inline != RunInline::Never);

        if want_inline {
            if let Some(tokens) = self.0.groups.try_acquire_all(&task.groups) {
                let pool = self.get_or_create_pool(task.pool.clone());
                pool.mark_running();
                let outcome = task.run();
                pool.mark_finished();
                drop(tokens);
                self.handle_outcome(outcome);
                self.evaluate_idle();
                return;
            }
            // Blocking is forbidden for inline execution; fall back to
            // enqueueing like any other task.
        }

        let pool = self.get_or_create_pool(task.pool.clone());
        pool.enqueue(task);
    }

    fn handle_outcome(&self, outcome: TaskOutcome) {
        if let Some(stats) = outcome.statistics {
            if let Some(sink) = self.0.sink.get() {
                sink.emit_reaction_event(ReactionEvent {
                    reaction_id: stats.reaction_id,
                    reactor_name: stats.reactor_name.clone(),
                    kind: ReactionEventKind::Finished(stats),
                });
            }
        }
    }

    pub fn add_idle_task(&self, reaction: Arc<Reaction>, pool_filter: Option<String>) -> u64 {
        let id = self.0.idle_id_gen.fetch_add(1, Ordering::SeqCst);
        self.0.idle_tasks.write().push(IdleTaskEntry {
            id,
            reaction,
            pool_filter,
        });
        id
    }

    pub fn remove_idle_task(&self, id: u64) {
        self.0.idle_tasks.write().retain(|entry| entry.id != id);
    }

    fn evaluate_idle(&self) {
        let entries = self.0.idle_tasks.read();
        let pools = self.0.pools.read();
        for entry in entries.iter() {
            if !entry.ready_to_fire() {
                continue;
            }
            let satisfied = match &entry.pool_filter {
                Some(pool_id) => pools.get(pool_id).map(|p| p.is_idle()).unwrap_or(false),
                None => pools.values().filter(|p| p.descriptor.counts_for_idle).all(|p| p.is_idle()),
            };
            if satisfied {
                if let TaskCreation::Created(task) = entry.reaction.get_task(false) {
                    drop(pools);
                    self.submit(task);
                    return self.evaluate_idle();
                }
            }
        }
    }

    fn all_pools_drained(&self) -> bool {
        self.0.pools.read().values().all(|p| p.is_idle())
    }

    fn wake_all_pools(&self) {
        for pool in self.0.pools.read().values() {
            pool.wake_all();
        }
    }

    /// Transition `Created -> Running` and spawn workers for every pool
    /// known so far except `MainThread`. Returns the `MainThread` pool,
    /// whose worker loop the caller must run (that's `start()`'s job at
    /// the `PowerPlant` layer, which also needs to emit `Startup` and the
    /// captured CLI args in between these two calls).
    pub fn begin_running(&self) -> ConfigResult<Arc<Pool>> {
        if self
            .0
            .state
            .compare_exchange(
                RunState::Created as u8,
                RunState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Err(ConfigurationError::AlreadyStarted);
        }

        let pools: Vec<Arc<Pool>> = self
            .0
            .pools
            .read()
            .values()
            .filter(|p| p.descriptor.id != PoolDescriptor::MAIN_THREAD_ID)
            .cloned()
            .collect();
        for pool in &pools {
            self.spawn_workers_for(pool);
        }

        Ok(self.get_or_create_pool(PoolDescriptor::main_thread()))
    }

    /// Run the worker loop for `pool` on the calling thread. Returns once
    /// the scheduler reaches `Terminated` and `pool`'s queue is empty.
    /// Used both by spawned worker threads and, for the `MainThread` pool,
    /// directly by the thread that called `start()`.
    pub fn run_worker(&self, pool: Arc<Pool>) {
        loop {
            if self.state() == RunState::Terminated && pool.is_empty() {
                break;
            }

            let task = match pool.pop_wait(POLL_INTERVAL) {
                Some(task) => task,
                None => {
                    self.maybe_finish_shutdown();
                    continue;
                }
            };

            let tokens = self.0.groups.acquire_all_blocking(&task.groups);
            pool.mark_running();
            let outcome = task.run();
            pool.mark_finished();
            drop(tokens);
            self.handle_outcome(outcome);
            self.evaluate_idle();
            self.maybe_finish_shutdown();
        }
    }

    fn maybe_finish_shutdown(&self) {
        if self.state() == RunState::ShuttingDown && self.all_pools_drained() {
            if self
                .0
                .state
                .compare_exchange(
                    RunState::ShuttingDown as u8,
                    RunState::Terminated as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                self.wake_all_pools();
            }
        }
    }

    /// Begin a graceful shutdown: subsequent work still drains normally.
    /// The caller (`PowerPlant::shutdown`) is responsible for emitting the
    /// `Shutdown` message under `Local` scope before calling this, so that
    /// shutdown-bound reactions' (IDLE priority) tasks are already queued
    /// behind in-flight normal work.
    pub fn begin_graceful_shutdown(&self) {
        self.set_state(RunState::ShuttingDown);
        self.wake_all_pools();
    }

    /// Forced shutdown: drop every queued task immediately and signal
    /// `Terminated`. Running callbacks are allowed to finish; no new work
    /// is scheduled afterwards.
    pub fn force_shutdown(&self) {
        self.set_state(RunState::Terminated);
        for pool in self.0.pools.read().values() {
            pool.clear();
        }
        self.wake_all_pools();
    }

    pub fn pool_snapshot(&self, id: &str) -> Option<Arc<Pool>> {
        self.0.pools.read().get(id).cloned()
    }

    /// Join every spawned worker thread. Called after the `MainThread`
    /// loop returns, so `start()` only returns once all workers have
    /// exited.
    pub fn join_workers(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.0.worker_threads.write());
        for handle in handles {
            let _ = handle.join();
        }
    }
}
