//! `emit<Local>(x)` makes `x` immediately observable to a subscriber's
//! `get` during that same dispatch, on the emitting thread.
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use nuclear::{ConfigResult, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Payload(u32);

struct ObservingReactor {
    _base: Reactor,
}

impl ObservingReactor {
    fn new(env: RuntimeEnvironment, seen: Arc<Mutex<Option<u32>>>) -> ConfigResult<Self> {
        let mut base = Reactor::new("ObservingReactor", env);
        base.on_trigger::<Payload, _>(vec![], move |payload| {
            *seen.lock().unwrap() = Some(payload.0);
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn subscriber_observes_the_freshly_emitted_value() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let seen = Arc::new(Mutex::new(None));
    let _reactor = ObservingReactor::new(plant.environment(), seen.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(20));

    plant.emit_local(Shared::new(Payload(42)));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(*seen.lock().unwrap(), Some(42));

    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");
}
