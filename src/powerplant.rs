//! The top-level container: owns the scheduler and the type store registry,
//! provides the `emit<Scope>`/`submit`/`log` entry points, and enforces the
//! process-wide singleton rule.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use once_cell::sync::OnceCell;

use crate::{
    chrono::{ChronoController, ChronoTask, SimpleChronoController, WatchdogRegistry},
    emit,
    environment::RuntimeCliArgs,
    error::{ConfigResult, ConfigurationError},
    events::{EventSink, ReactionEvent},
    io_controller::{IoController, StubIoController},
    lifecycle::{Shutdown, Startup},
    logger::{self, LogLevel, LogMessage},
    network::{LoopbackNetworkController, NetworkController},
    reaction::Reaction,
    reactor_base::RuntimeEnvironment,
    scheduler::Scheduler,
    store::{Shared, TypeStoreRegistry},
};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Registry/scheduler/collaborators bundle that every reactor and emit call
/// ultimately goes through. One per process.
pub struct PowerPlant {
    registry: Arc<TypeStoreRegistry>,
    scheduler: Scheduler,
    chrono: Arc<dyn ChronoController>,
    network: Arc<dyn NetworkController>,
    io: Arc<dyn IoController>,
    watchdogs: Arc<WatchdogRegistry>,
    cli_args: RuntimeCliArgs,
    self_sink: OnceCell<Arc<dyn EventSink>>,
}

impl PowerPlant {
    /// Construct the process's one `PowerPlant`. A second call anywhere in
    /// the process is a fatal `ConfigurationError::DuplicatePowerPlant`.
    pub fn install(cli_args: RuntimeCliArgs) -> ConfigResult<Arc<Self>> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(ConfigurationError::DuplicatePowerPlant);
        }

        logger::init(!cli_args.no_colour);

        let plant = Arc::new(Self {
            registry: Arc::new(TypeStoreRegistry::new()),
            scheduler: Scheduler::new(cli_args.default_pool_concurrency),
            chrono: SimpleChronoController::new(),
            network: LoopbackNetworkController::new(),
            io: StubIoController::new(),
            watchdogs: Arc::new(WatchdogRegistry::new()),
            cli_args,
            self_sink: OnceCell::new(),
        });

        let sink: Arc<dyn EventSink> = plant.clone();
        plant.scheduler.set_sink(sink.clone());
        let _ = plant.self_sink.set(sink);

        Ok(plant)
    }

    /// An environment handle suitable for constructing a `Reactor`.
    pub fn environment(&self) -> RuntimeEnvironment {
        RuntimeEnvironment {
            registry: self.registry.clone(),
            scheduler: self.scheduler.clone(),
            sink: self.self_sink.get().expect("sink set during install").clone(),
            chrono: self.chrono.clone(),
            watchdogs: self.watchdogs.clone(),
        }
    }

    pub fn cli_args(&self) -> &RuntimeCliArgs {
        &self.cli_args
    }

    pub fn network_controller(&self) -> &Arc<dyn NetworkController> {
        &self.network
    }

    pub fn io_controller(&self) -> &Arc<dyn IoController> {
        &self.io
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        self.self_sink.get().expect("sink set during install").clone()
    }

    /// `Local`: default scope. Submits a task per subscriber.
    pub fn emit_local<M: Send + Sync + 'static>(&self, payload: Shared<M>) {
        let sink = self.sink();
        emit::dispatch(&self.registry, &self.scheduler, &sink, payload, false);
    }

    /// `Inline`: identical subscriber walk, but every task is created with
    /// `request_inline=true`; any whose `run_inline != Never` executes on
    /// this thread before the call returns.
    pub fn emit_inline<M: Send + Sync + 'static>(&self, payload: Shared<M>) {
        let sink = self.sink();
        emit::dispatch(&self.registry, &self.scheduler, &sink, payload, true);
    }

    /// `Initialise`: re-emits the payload under `Local` once the system
    /// reaches `Running`, silently dropped if it already has.
    pub fn emit_initialise<M: Send + Sync + 'static>(self: &Arc<Self>, payload: Shared<M>) {
        use crate::scheduler::RunState;
        if self.scheduler.state() != RunState::Created {
            return;
        }
        let this = self.clone();
        let reaction = Reaction::new(
            crate::reaction::ReactionIdentifiers::new("PowerPlant", "Initialise", "emit_initialise"),
            false,
            Box::new(move |_| {
                this.emit_local(payload.clone());
                crate::reaction::TaskCreation::Blocked
            }),
        );
        // Initialise has no data source of its own: piggyback on the
        // Startup chrono-less path by driving it directly off Startup's
        // dispatch instead of a real chrono task, since it must fire
        // exactly once, at the Created->Running transition, not on a timer.
        self.registry.store_for::<Startup>().subscribe(reaction);
    }

    /// `Delay(d)`: registers a single-shot chrono task that performs a
    /// `Local` emit of the payload when it fires.
    pub fn emit_delay<M: Send + Sync + 'static>(self: &Arc<Self>, payload: Shared<M>, delay: std::time::Duration) {
        let this = self.clone();
        self.chrono.schedule(ChronoTask {
            id: crate::chrono::next_chrono_id(),
            fire_at: std::time::Instant::now() + delay,
            period: None,
            callback: Box::new(move |_now| {
                this.emit_local(payload.clone());
                false
            }),
        });
    }

    /// `Network(target, reliable)`: serializes and hands off to the network
    /// collaborator.
    pub fn emit_network<M: serde::Serialize + 'static>(
        &self,
        payload: &M,
        target: Option<String>,
        reliable: bool,
    ) -> Result<(), crate::serialize::SerializeError> {
        let bytes = crate::serialize::serialize_json(payload)?;
        let hash = crate::network::hash_for_type_name(std::any::type_name::<M>());
        self.network.send(crate::network::NetworkEmit { target, hash, payload: bytes, reliable });
        Ok(())
    }

    /// `UDP(to, port, …)`: same serialization path as `Network`, addressed
    /// directly rather than by reactor name.
    pub fn emit_udp<M: serde::Serialize + 'static>(
        &self,
        payload: &M,
        to: String,
        reliable: bool,
    ) -> Result<(), crate::serialize::SerializeError> {
        self.emit_network(payload, Some(to), reliable)
    }

    /// `Watchdog`: refreshes the service-time map for `group`.
    pub fn emit_watchdog(&self, group: &str) {
        self.watchdogs.service(group, std::time::Instant::now());
    }

    pub fn submit(&self, task: crate::reaction::ReactionTask) {
        self.scheduler.submit(task);
    }

    pub fn add_idle_task(&self, reaction: Arc<Reaction>, pool: Option<String>) -> u64 {
        self.scheduler.add_idle_task(reaction, pool)
    }

    pub fn remove_idle_task(&self, id: u64) {
        self.scheduler.remove_idle_task(id);
    }

    /// Format and emit a `LogMessage` under `Inline` scope.
    pub fn log(self: &Arc<Self>, reactor_name: &str, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        let display_level = logger::render(
            &LogMessage {
                level,
                display_level: String::new(),
                text: text.clone(),
                reactor_name: reactor_name.to_string(),
                statistics: None,
            },
            false,
        );
        let message = LogMessage {
            level,
            display_level,
            text,
            reactor_name: reactor_name.to_string(),
            statistics: None,
        };
        self.emit_inline(Shared::new(message));
    }

    pub fn running(&self) -> bool {
        self.scheduler.state() == crate::scheduler::RunState::Running
    }

    /// Drive the startup sequence on the calling thread.
    /// Returns once run-state reaches `Terminated`.
    pub fn start(self: &Arc<Self>) -> ConfigResult<()> {
        let main_pool = self.scheduler.begin_running()?;
        self.emit_local(Shared::new(Startup));
        self.emit_local(Shared::new(self.cli_args.clone()));
        self.scheduler.run_worker(main_pool);
        self.scheduler.join_workers();
        self.chrono.shutdown();
        Ok(())
    }

    /// Begin shutdown. `force=true` skips the
    /// `Shutdown` emit and drain, terminating immediately.
    pub fn shutdown(self: &Arc<Self>, force: bool) {
        if force {
            self.scheduler.force_shutdown();
            return;
        }
        self.scheduler.begin_graceful_shutdown();
        self.emit_local(Shared::new(Shutdown));
    }
}

impl EventSink for PowerPlant {
    fn emit_reaction_event(&self, event: ReactionEvent) {
        self.emit_inline(Shared::new(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_twice_fails() {
        INSTALLED.store(false, Ordering::SeqCst);
        let first = PowerPlant::install(RuntimeCliArgs::default());
        assert!(first.is_ok());
        let second = PowerPlant::install(RuntimeCliArgs::default());
        assert!(matches!(second, Err(ConfigurationError::DuplicatePowerPlant)));
        INSTALLED.store(false, Ordering::SeqCst);
    }
}
