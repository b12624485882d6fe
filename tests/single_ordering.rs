//! Scenario: a `Single`-bound reaction must never have two tasks in flight
//! at once, no matter how many emits arrive while one is still running.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use nuclear::{single, ConfigResult, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

#[derive(Debug, Clone)]
struct Tick;

struct Counter {
    concurrent: AtomicU32,
    max_concurrent: AtomicU32,
    total_runs: AtomicU32,
}

struct SingleReactor {
    _base: Reactor,
}

impl SingleReactor {
    fn new(env: RuntimeEnvironment, counter: Arc<Counter>) -> ConfigResult<Self> {
        let mut base = Reactor::new("SingleReactor", env);
        base.on_trigger::<Tick, _>(vec![single()], move |_tick| {
            let now_concurrent = counter.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            counter.max_concurrent.fetch_max(now_concurrent, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            counter.total_runs.fetch_add(1, Ordering::SeqCst);
            counter.concurrent.fetch_sub(1, Ordering::SeqCst);
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn single_reaction_never_runs_two_tasks_at_once() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let counter = Arc::new(Counter {
        concurrent: AtomicU32::new(0),
        max_concurrent: AtomicU32::new(0),
        total_runs: AtomicU32::new(0),
    });
    let _reactor = SingleReactor::new(plant.environment(), counter.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());

    thread::sleep(Duration::from_millis(20));
    for _ in 0..5 {
        plant.emit_local(Shared::new(Tick));
        thread::sleep(Duration::from_millis(5));
    }

    thread::sleep(Duration::from_millis(200));
    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");

    assert!(counter.max_concurrent.load(Ordering::SeqCst) <= 1);
    let runs = counter.total_runs.load(Ordering::SeqCst);
    assert!((1..=2).contains(&runs), "expected 1 or 2 runs, got {runs}");
}
