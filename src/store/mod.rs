//! The typed publish/subscribe data store: a last-value cache plus ordered
//! subscriber list per message type, and the thread-local current-value
//! override used by emitters.
mod current_value;
mod registry;
mod type_store;

pub use current_value::CurrentValueGuard;
pub(crate) use current_value::peek_override;
pub use registry::TypeStoreRegistry;
pub use type_store::{SubscriptionToken, TypeStore};

/// Shared, reference-counted handle to a message value. Readers hold their
/// own snapshot; a later `set` never invalidates a handle already taken.
pub type Shared<T> = std::sync::Arc<T>;
