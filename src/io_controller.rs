//! The I/O collaborator: file-descriptor readiness via `poll`/event
//! objects. Out of scope for a full implementation;
//! only the message shapes and a minimal stub sufficient for `on<IO>`
//! bindings to compile and unbind cleanly are provided here.
use std::sync::{Arc, Mutex};

/// Marker type for `Unbind<IO>`.
pub struct IO;

/// Message accepted by the I/O controller to begin watching `fd` for the
/// readiness events in `events_mask`, invoking `reaction` when ready.
pub struct IOConfiguration {
    pub fd: i32,
    pub events_mask: u32,
    pub reaction_id: u64,
}

/// Emitted by the I/O controller once a registered callback completes.
#[derive(Debug, Clone, Copy)]
pub struct IOFinished {
    pub reaction_id: u64,
}

/// What the core expects from the I/O collaborator.
pub trait IoController: Send + Sync {
    fn watch(&self, config: IOConfiguration);
    fn unbind(&self, reaction_id: u64);
}

/// In-process stub: records watched descriptors but never actually polls
/// them, since a real epoll/kqueue/IOCP backend is outside this crate's
/// scope. Sufficient for bind/unbind round trips in tests.
#[derive(Default)]
pub struct StubIoController {
    watched: Mutex<Vec<IOConfiguration>>,
}

impl StubIoController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn watched_count(&self) -> usize {
        self.watched.lock().unwrap().len()
    }
}

impl IoController for StubIoController {
    fn watch(&self, config: IOConfiguration) {
        self.watched.lock().unwrap().push(config);
    }

    fn unbind(&self, reaction_id: u64) {
        self.watched.lock().unwrap().retain(|c| c.reaction_id != reaction_id);
    }
}
