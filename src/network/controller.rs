//! The network collaborator: reliable/unreliable UDP transport with
//! fragmentation, ACK/NACK, multicast discovery. Out
//! of scope for a full implementation; this is a minimal in-process
//! loopback stub sufficient to exercise `emit::<Network>`/`emit::<UDP>`
//! and the wire structs end-to-end without a real socket.
use std::sync::{Arc, Mutex};

use super::wire::type_hash;

pub struct NetworkConfiguration {
    pub name: String,
    pub announce_addr: String,
    pub announce_port: u16,
    pub bind_addr: String,
    pub mtu: usize,
}

pub struct NetworkEmit {
    pub target: Option<String>,
    pub hash: u64,
    pub payload: Vec<u8>,
    pub reliable: bool,
}

#[derive(Debug, Clone)]
pub struct NetworkJoin {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NetworkLeave {
    pub name: String,
}

/// Thread-local marker carried alongside a deserialized network payload
/// so a subscriber can tell which peer it arrived from.
#[derive(Debug, Clone)]
pub struct NetworkSource {
    pub peer: String,
}

/// What the core expects from the network collaborator.
pub trait NetworkController: Send + Sync {
    fn configure(&self, config: NetworkConfiguration);
    fn send(&self, emit: NetworkEmit);
}

/// In-process loopback: every `send` is immediately delivered back to
/// `deliveries`, keyed by the message's type hash, as if a peer on the
/// same host had received and deserialized it. No fragmentation, ACK/NACK
/// or peer discovery — those require a real socket and are out of scope.
#[derive(Default)]
pub struct LoopbackNetworkController {
    name: Mutex<String>,
    deliveries: Mutex<Vec<(u64, Vec<u8>, bool)>>,
}

impl LoopbackNetworkController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deliveries_for(&self, hash: u64) -> Vec<Vec<u8>> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _, _)| *h == hash)
            .map(|(_, payload, _)| payload.clone())
            .collect()
    }
}

impl NetworkController for LoopbackNetworkController {
    fn configure(&self, config: NetworkConfiguration) {
        *self.name.lock().unwrap() = config.name;
    }

    fn send(&self, emit: NetworkEmit) {
        self.deliveries.lock().unwrap().push((emit.hash, emit.payload, emit.reliable));
    }
}

pub fn hash_for_type_name(name: &str) -> u64 {
    type_hash(name)
}
