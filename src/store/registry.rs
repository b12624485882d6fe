use std::{any::{Any, TypeId}, collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use super::type_store::TypeStore;

/// Type-erased home for every [`TypeStore<M>`] in a process. One instance
/// lives on the [`crate::powerplant::PowerPlant`]; stores are created
/// lazily on first reference to a new message type `M`.
#[derive(Default)]
pub struct TypeStoreRegistry {
    stores: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl TypeStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or lazily create) the store for message type `M`.
    pub fn store_for<M: Send + Sync + 'static>(&self) -> Arc<TypeStore<M>> {
        let id = TypeId::of::<M>();

        if let Some(existing) = self.stores.read().get(&id) {
            return existing
                .clone()
                .downcast::<TypeStore<M>>()
                .expect("TypeId collision in TypeStoreRegistry");
        }

        let mut stores = self.stores.write();
        let entry = stores
            .entry(id)
            .or_insert_with(|| Arc::new(TypeStore::<M>::new()) as Arc<dyn Any + Send + Sync>);
        entry
            .clone()
            .downcast::<TypeStore<M>>()
            .expect("TypeId collision in TypeStoreRegistry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    #[test]
    fn same_type_yields_same_store() {
        let registry = TypeStoreRegistry::new();
        let a = registry.store_for::<u32>();
        a.set(StdArc::new(7));
        let b = registry.store_for::<u32>();
        assert_eq!(*b.get().unwrap(), 7);
    }

    #[test]
    fn different_types_are_isolated() {
        let registry = TypeStoreRegistry::new();
        registry.store_for::<u32>().set(StdArc::new(1));
        registry.store_for::<u64>().set(StdArc::new(2));
        assert_eq!(*registry.store_for::<u32>().get().unwrap(), 1);
        assert_eq!(*registry.store_for::<u64>().get().unwrap(), 2);
    }
}
