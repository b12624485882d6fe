//! Demo host process: a single reactor that logs on startup, emits a
//! `Ping` every second, echoes each one it observes, and logs again on
//! shutdown. Exercises the full `Startup`/`Every`/`Trigger`/`Shutdown`
//! path end to end.
use std::{sync::Arc, time::Duration};

use nuclear::{
    environment::RuntimeCliArgs, logger::LogLevel, priority, ConfigResult, PowerPlant, Priority,
    Reactor, RuntimeEnvironment,
};

#[derive(Debug, Clone)]
struct Ping {
    sequence: u64,
}

struct EchoReactor {
    base: Reactor,
}

impl EchoReactor {
    fn new(env: RuntimeEnvironment, plant: Arc<PowerPlant>) -> ConfigResult<Self> {
        let mut base = Reactor::new("EchoReactor", env);

        {
            let plant = plant.clone();
            base.on_startup(vec![], move || {
                plant.log("EchoReactor", LogLevel::Info, "starting up");
            })?;
        }

        {
            let counter = std::sync::atomic::AtomicU64::new(0);
            let plant = plant.clone();
            base.on_every(Duration::from_secs(1), vec![], move || {
                let sequence = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                plant.emit_local(Arc::new(Ping { sequence }));
            })?;
        }

        {
            let plant = plant.clone();
            base.on_trigger::<Ping, _>(vec![priority(Priority::HIGH)], move |ping| {
                plant.log("EchoReactor", LogLevel::Info, format!("ping #{}", ping.sequence));
            })?;
        }

        {
            let plant = plant.clone();
            base.on_shutdown(vec![], move || {
                plant.log("EchoReactor", LogLevel::Info, "shutting down");
            })?;
        }

        Ok(Self { base })
    }
}

fn main() -> ConfigResult<()> {
    let cli_args = RuntimeCliArgs::from_env();
    let plant = PowerPlant::install(cli_args)?;

    let _reactor = EchoReactor::new(plant.environment(), plant.clone())?;

    let shutdown_plant = plant.clone();
    ctrlc_shutdown(move || shutdown_plant.shutdown(false));

    plant.start()
}

/// Installs a `Ctrl-C` handler that triggers a graceful shutdown. No signal
/// crate dependency: a dedicated thread blocking on stdin EOF would do just
/// as well for a demo binary, but real deployments wire this to `signal-hook`.
fn ctrlc_shutdown(on_signal: impl Fn() + Send + 'static) {
    let _ = std::thread::Builder::new()
        .name("nuclear-signal".to_string())
        .spawn(move || {
            use std::io::Read;
            let mut buf = [0u8; 1];
            while std::io::stdin().read(&mut buf).unwrap_or(0) > 0 {}
            on_signal();
        });
}
