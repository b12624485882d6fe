//! Scenario: an `Inline` emit issued from inside a callback running on a
//! pool thread recurses on that same thread before the outer callback
//! returns.
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use nuclear::{inline, ConfigResult, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

#[derive(Debug, Clone)]
struct M;
#[derive(Debug, Clone)]
struct N;

struct ReactorX {
    _base: Reactor,
}

impl ReactorX {
    fn new(env: RuntimeEnvironment, plant: Arc<PowerPlant>, order: Arc<Mutex<Vec<&'static str>>>) -> ConfigResult<Self> {
        let mut base = Reactor::new("ReactorX", env);
        base.on_trigger::<M, _>(vec![], move |_| {
            order.lock().unwrap().push("X-start");
            plant.emit_inline(Shared::new(N));
            order.lock().unwrap().push("X-end");
        })?;
        Ok(Self { _base: base })
    }
}

struct ReactorY {
    _base: Reactor,
}

impl ReactorY {
    fn new(env: RuntimeEnvironment, order: Arc<Mutex<Vec<&'static str>>>) -> ConfigResult<Self> {
        let mut base = Reactor::new("ReactorY", env);
        base.on_trigger::<N, _>(vec![inline()], move |_| {
            order.lock().unwrap().push("Y");
        })?;
        Ok(Self { _base: base })
    }
}

#[test]
fn inline_emit_recurses_on_the_same_worker_thread() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let order = Arc::new(Mutex::new(Vec::new()));
    let _x = ReactorX::new(plant.environment(), plant.clone(), order.clone()).expect("bind x");
    let _y = ReactorY::new(plant.environment(), order.clone()).expect("bind y");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(20));

    plant.emit_local(Shared::new(M));
    thread::sleep(Duration::from_millis(100));

    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");

    assert_eq!(*order.lock().unwrap(), vec!["X-start", "Y", "X-end"]);
}
