//! Wire protocol and the network collaborator interface.
pub mod controller;
pub mod wire;

pub use controller::{
    hash_for_type_name, LoopbackNetworkController, NetworkConfiguration, NetworkController,
    NetworkEmit, NetworkJoin, NetworkLeave, NetworkSource,
};
