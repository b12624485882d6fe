//! Zero-sized trigger types for the `Startup`/`Shutdown` built-in words.
//! Emitted once each, under `Local` scope, by `PowerPlant::start`/`shutdown`.
#[derive(Debug, Clone, Copy)]
pub struct Startup;

#[derive(Debug, Clone, Copy)]
pub struct Shutdown;
