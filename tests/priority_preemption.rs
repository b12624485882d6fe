//! Scenario: within a single-thread pool, a HIGH-priority task enqueued
//! after a NORMAL one still runs first, as long as neither has started yet.
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use nuclear::{priority, ConfigResult, PoolId, PowerPlant, Priority, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

struct SerialPool;
impl PoolId for SerialPool {
    const NAME: &'static str = "serial-preemption-pool";
    const CONCURRENCY: u32 = 1;
}

#[derive(Debug, Clone)]
struct A;
#[derive(Debug, Clone)]
struct B;

struct OrderedReactor {
    _base: Reactor,
}

impl OrderedReactor {
    fn new(env: RuntimeEnvironment, order: Arc<Mutex<Vec<&'static str>>>) -> ConfigResult<Self> {
        let mut base = Reactor::new("OrderedReactor", env);
        {
            let order = order.clone();
            base.on_trigger::<A, _>(vec![nuclear::pool::<SerialPool>(), priority(Priority::NORMAL)], move |_| {
                order.lock().unwrap().push("A");
            })?;
        }
        {
            let order = order.clone();
            base.on_trigger::<B, _>(vec![nuclear::pool::<SerialPool>(), priority(Priority::HIGH)], move |_| {
                order.lock().unwrap().push("B");
            })?;
        }
        Ok(Self { _base: base })
    }
}

#[test]
fn higher_priority_task_runs_first_when_enqueued_before_either_starts() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let order = Arc::new(Mutex::new(Vec::new()));
    let _reactor = OrderedReactor::new(plant.environment(), order.clone()).expect("bind");

    // Both emitted before `start()`: tasks queue but no worker exists yet
    // to race the ordering.
    plant.emit_local(Shared::new(A));
    plant.emit_local(Shared::new(B));

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());

    thread::sleep(Duration::from_millis(100));
    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");

    assert_eq!(*order.lock().unwrap(), vec!["B", "A"]);
}
