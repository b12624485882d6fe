//! `unbind` called twice has the same effect as calling it once, and once
//! it returns no task for that reaction is ever created again.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use nuclear::{ConfigResult, PowerPlant, Reactor, RuntimeCliArgs, RuntimeEnvironment, Shared};

#[derive(Debug, Clone)]
struct Event;

struct CountingReactor {
    base: Reactor,
}

impl CountingReactor {
    fn new(env: RuntimeEnvironment, count: Arc<AtomicU32>) -> ConfigResult<Self> {
        let mut base = Reactor::new("CountingReactor", env);
        base.on_trigger::<Event, _>(vec![], move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })?;
        Ok(Self { base })
    }
}

#[test]
fn unbind_is_idempotent_and_final() {
    let plant = PowerPlant::install(RuntimeCliArgs::default()).expect("install");
    let count = Arc::new(AtomicU32::new(0));
    let reactor = CountingReactor::new(plant.environment(), count.clone()).expect("bind");

    let start_plant = plant.clone();
    let handle = thread::spawn(move || start_plant.start());
    thread::sleep(Duration::from_millis(20));

    plant.emit_local(Shared::new(Event));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let handle_to_reaction = reactor.base.reactions()[0].clone();
    handle_to_reaction.unbind();
    handle_to_reaction.unbind(); // idempotent: must not panic or double-decrement anything

    plant.emit_local(Shared::new(Event));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), 1, "unbound reaction must not fire again");

    plant.shutdown(false);
    handle.join().expect("start thread").expect("clean shutdown");
}
