//! Scenario: a graceful shutdown drains every already-queued task before
//! Shutdown-bound reactions run, and `start()` only returns afterwards.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use nuclear::{pool, ConfigResult, PoolId, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

struct WidePool;
impl PoolId for WidePool {
    const NAME: &'static str = "wide-drain-pool";
    const CONCURRENCY: u32 = 8;
}

#[derive(Debug, Clone)]
struct Work;

struct DrainReactor {
    _base: Reactor,
}

impl DrainReactor {
    fn new(
        env: RuntimeEnvironment,
        completed: Arc<AtomicU32>,
        completed_at_shutdown: Arc<AtomicU32>,
    ) -> ConfigResult<Self> {
        let mut base = Reactor::new("DrainReactor", env);
        {
            let completed = completed.clone();
            base.on_trigger::<Work, _>(vec![pool::<WidePool>()], move |_| {
                thread::sleep(Duration::from_millis(10));
                completed.fetch_add(1, Ordering::SeqCst);
            })?;
        }
        base.on_shutdown(vec![], move || {
            completed_at_shutdown.store(completed.load(Ordering::SeqCst), Ordering::SeqCst);
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn graceful_shutdown_drains_all_queued_work_first() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let completed = Arc::new(AtomicU32::new(0));
    let completed_at_shutdown = Arc::new(AtomicU32::new(0));
    let _reactor =
        DrainReactor::new(plant.environment(), completed.clone(), completed_at_shutdown.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(10));

    for _ in 0..100 {
        plant.emit_local(Shared::new(Work));
    }

    thread::sleep(Duration::from_millis(20));
    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");

    assert_eq!(completed.load(Ordering::SeqCst), 100);
    assert_eq!(completed_at_shutdown.load(Ordering::SeqCst), 100);
}
