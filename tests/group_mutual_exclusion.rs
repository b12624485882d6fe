//! Scenario: three reactions sharing a 2-token group never run more than
//! two of themselves concurrently.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use nuclear::{group, ConfigResult, GroupId, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

struct TestGroup;
impl GroupId for TestGroup {
    const NAME: &'static str = "mutex-test-group";
}

#[derive(Debug, Clone)]
struct Fire(u8);

struct Counters {
    concurrent: AtomicU32,
    max_concurrent: AtomicU32,
    completed: AtomicU32,
}

struct GroupedReactor {
    _base: Reactor,
}

impl GroupedReactor {
    fn new(env: RuntimeEnvironment, counters: Arc<Counters>) -> ConfigResult<Self> {
        let mut base = Reactor::new("GroupedReactor", env);
        base.on_trigger::<Fire, _>(vec![group::<TestGroup, 2>()], move |_fire| {
            let now = counters.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            counters.max_concurrent.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            counters.concurrent.fetch_sub(1, Ordering::SeqCst);
            counters.completed.fetch_add(1, Ordering::SeqCst);
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn group_token_count_bounds_concurrency() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let counters = Arc::new(Counters {
        concurrent: AtomicU32::new(0),
        max_concurrent: AtomicU32::new(0),
        completed: AtomicU32::new(0),
    });
    let _reactor = GroupedReactor::new(plant.environment(), counters.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(20));

    let began = Instant::now();
    for i in 0..3u8 {
        plant.emit_local(Shared::new(Fire(i)));
    }

    while counters.completed.load(Ordering::SeqCst) < 3 && began.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(10));
    }
    let elapsed = began.elapsed();

    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");

    assert_eq!(counters.completed.load(Ordering::SeqCst), 3);
    assert!(counters.max_concurrent.load(Ordering::SeqCst) <= 2);
    assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
}
