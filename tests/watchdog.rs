//! Scenario: a watchdog fires once servicing stops, roughly on the
//! timeout/period cadence, and stays quiet again once servicing resumes.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use nuclear::{ConfigResult, GroupId, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment};

struct WatchedGroup;
impl GroupId for WatchedGroup {
    const NAME: &'static str = "watchdog-test-group";
}

struct WatchdogReactor {
    _base: Reactor,
}

impl WatchdogReactor {
    fn new(env: RuntimeEnvironment, fires: Arc<AtomicU32>) -> ConfigResult<Self> {
        let mut base = Reactor::new("WatchdogReactor", env);
        base.on_watchdog::<WatchedGroup, _>(1, Duration::from_millis(100), vec![], move || {
            fires.fetch_add(1, Ordering::SeqCst);
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn watchdog_fires_after_servicing_stops() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let fires = Arc::new(AtomicU32::new(0));
    let _reactor = WatchdogReactor::new(plant.environment(), fires.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(20));

    let began = Instant::now();
    while began.elapsed() < Duration::from_millis(300) {
        plant.emit_watchdog(WatchedGroup::NAME);
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(fires.load(Ordering::SeqCst), 0, "should not fire while serviced");

    // Stop servicing and watch it come overdue.
    thread::sleep(Duration::from_millis(250));
    let fired_after_silence = fires.load(Ordering::SeqCst);
    assert!(fired_after_silence >= 1, "expected at least one overdue fire");

    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");
}
