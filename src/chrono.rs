//! The timekeeping collaborator: periodic (`Every`), delayed (`Delay`) and
//! watchdog chrono tasks. Out of scope for a full
//! implementation; this is the minimal in-process stub the core's `Every`/
//! `Delay`/`Watchdog` words need to function and be tested end-to-end.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

/// One registered chrono task. `period` being `Some` means "recurring";
/// the callback's return value then decides whether it is rescheduled
/// (`true`) or dropped (`false`, e.g. a `Watchdog` whose group was
/// unbound mid-flight). A `None` period is single-shot (`Delay`).
pub struct ChronoTask {
    pub id: u64,
    pub fire_at: Instant,
    pub period: Option<Duration>,
    pub callback: Box<dyn Fn(Instant) -> bool + Send>,
}

/// What the core expects from the chrono collaborator.
pub trait ChronoController: Send + Sync {
    fn schedule(&self, task: ChronoTask);
    fn unbind(&self, id: u64);
    /// Stop the background poller, if this implementation owns one.
    /// Default no-op for implementations with nothing to join.
    fn shutdown(&self) {}
}

static CHRONO_IDS: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh chrono task id (used by `Every`/`Delay`/`Watchdog`
/// binders so their unbinder can name the task it registered).
pub fn next_chrono_id() -> u64 {
    CHRONO_IDS.fetch_add(1, Ordering::SeqCst)
}

/// A background thread polling the nearest-due task. Simple by design:
/// a `Vec` scanned linearly rather than a binary heap, since the core
/// only ever has a handful of chrono tasks (timers, watchdogs) live at
/// once — this is documented as a deliberate simplification, not a
/// production scheduler.
pub struct SimpleChronoController {
    tasks: Mutex<Vec<ChronoTask>>,
    wake: Condvar,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SimpleChronoController {
    pub fn new() -> Arc<Self> {
        let this = Arc::new(Self {
            tasks: Mutex::new(Vec::new()),
            wake: Condvar::new(),
            running: AtomicBool::new(true),
            worker: Mutex::new(None),
        });
        let worker_handle = {
            let this = this.clone();
            std::thread::Builder::new()
                .name("nuclear-chrono".to_string())
                .spawn(move || this.poll_loop())
                .expect("failed to spawn chrono worker thread")
        };
        *this.worker.lock() = Some(worker_handle);
        this
    }

    fn poll_loop(&self) {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let mut tasks = self.tasks.lock();
            let now = Instant::now();
            let mut i = 0;
            let mut due = Vec::new();
            while i < tasks.len() {
                if tasks[i].fire_at <= now {
                    due.push(tasks.remove(i));
                } else {
                    i += 1;
                }
            }
            let next_wait = tasks
                .iter()
                .map(|t| t.fire_at.saturating_duration_since(now))
                .min()
                .unwrap_or(Duration::from_millis(50))
                .min(Duration::from_millis(50));
            if due.is_empty() {
                self.wake.wait_for(&mut tasks, next_wait);
                continue;
            }
            drop(tasks);

            for mut task in due {
                let keep_going = (task.callback)(now);
                if keep_going {
                    if let Some(period) = task.period {
                        task.fire_at = now + period;
                        self.tasks.lock().push(task);
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl ChronoController for SimpleChronoController {
    fn schedule(&self, task: ChronoTask) {
        self.tasks.lock().push(task);
        self.wake.notify_all();
    }

    fn unbind(&self, id: u64) {
        self.tasks.lock().retain(|t| t.id != id);
        self.wake.notify_all();
    }

    fn shutdown(&self) {
        SimpleChronoController::shutdown(self);
    }
}

/// `Watchdog<G, N, period>` support: a per-group last-service timestamp,
/// refreshed by `emit::<Watchdog>(ServiceWatchdog<G>)` and read by the
/// recurring chrono task registered for that group.
#[derive(Default)]
pub struct WatchdogRegistry {
    last_service: Mutex<HashMap<String, Instant>>,
}

impl WatchdogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self, group: &str, at: Instant) {
        self.last_service.lock().insert(group.to_string(), at);
    }

    /// Time of last service for `group`, or `None` if it was never
    /// serviced (treated as "serviced at registration time" by the
    /// caller, matching the original's behaviour of arming from bind).
    pub fn last_service(&self, group: &str) -> Option<Instant> {
        self.last_service.lock().get(group).copied()
    }
}

/// `emit::<Watchdog>(ServiceWatchdog<G>())`'s payload: refreshes the
/// service time for group `G`. Carries the group id as a plain string
/// since `G` only needs to identify a `WatchdogRegistry` key, not be
/// constructed.
#[derive(Debug, Clone)]
pub struct ServiceWatchdog {
    pub group: String,
}
