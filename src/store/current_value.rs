use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    sync::Arc,
};

thread_local! {
    /// Per-thread, per-type stack of current-value overrides. An emit
    /// pushes the value it is about to dispatch before invoking any
    /// subscriber factory, so that a nested `get` for the same type sees
    /// the fresh value instead of racing with `TypeStore::latest`.
    static OVERRIDES: RefCell<HashMap<TypeId, Vec<Box<dyn Any>>>> =
        RefCell::new(HashMap::new());
}

/// RAII guard restoring the previous override (or removing it entirely) on
/// drop. Exit paths always run through `Drop`, including panics unwinding
/// through a subscriber's factory.
pub struct CurrentValueGuard {
    type_id: TypeId,
}

impl CurrentValueGuard {
    /// Push an override for type `M` on the current thread.
    pub fn install<M: 'static>(value: Option<Arc<M>>) -> Self {
        let type_id = TypeId::of::<M>();
        OVERRIDES.with(|overrides| {
            overrides
                .borrow_mut()
                .entry(type_id)
                .or_default()
                .push(Box::new(value) as Box<dyn Any>);
        });
        Self { type_id }
    }
}

impl Drop for CurrentValueGuard {
    fn drop(&mut self) {
        OVERRIDES.with(|overrides| {
            if let Some(stack) = overrides.borrow_mut().get_mut(&self.type_id) {
                stack.pop();
            }
        });
    }
}

/// Read the top of the current thread's override stack for `M`, if any.
/// `Some(None)` means an override is installed but carries no value;
/// `None` means there is no override at all and the caller should fall
/// back to the type store's `latest`.
pub(crate) fn peek_override<M: 'static>() -> Option<Option<Arc<M>>> {
    OVERRIDES.with(|overrides| {
        overrides
            .borrow()
            .get(&TypeId::of::<M>())
            .and_then(|stack| stack.last())
            .map(|boxed| {
                boxed
                    .downcast_ref::<Option<Arc<M>>>()
                    .expect("current-value override type mismatch")
                    .clone()
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_shadows_and_drop_restores() {
        assert!(peek_override::<u32>().is_none());
        {
            let _guard = CurrentValueGuard::install(Some(Arc::new(9u32)));
            assert_eq!(*peek_override::<u32>().unwrap().unwrap(), 9);
        }
        assert!(peek_override::<u32>().is_none());
    }

    #[test]
    fn nested_installs_stack() {
        let _outer = CurrentValueGuard::install(Some(Arc::new(1u32)));
        {
            let _inner = CurrentValueGuard::install(Some(Arc::new(2u32)));
            assert_eq!(*peek_override::<u32>().unwrap().unwrap(), 2);
        }
        assert_eq!(*peek_override::<u32>().unwrap().unwrap(), 1);
    }
}
