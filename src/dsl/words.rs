use std::collections::VecDeque;

use crate::store::Shared;

/// `Optional<W>`: wraps a `get` so that missing data does not abort task
/// creation. Plain alias for `Option<Shared<T>>`; kept
/// as a type so call sites read the same as the DSL word.
pub type Optional<T> = Option<Shared<T>>;

/// `Last<N, W>`: each gotten `T` becomes a bounded sequence of up to `N`
/// most-recent values, carried over transiently across non-firing gets.
/// Owned by the reaction's closure state, pushed to on every fresh value
/// for `T` observed while evaluating `get`.
#[derive(Debug)]
pub struct Last<T> {
    capacity: usize,
    values: VecDeque<Shared<T>>,
}

impl<T> Last<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Push a freshly observed value, evicting the oldest once `capacity`
    /// values are held.
    pub fn push(&mut self, value: Shared<T>) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Current snapshot, most-recent last.
    pub fn snapshot(&self) -> Vec<Shared<T>> {
        self.values.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut last: Last<u32> = Last::new(2);
        last.push(Shared::new(1));
        last.push(Shared::new(2));
        last.push(Shared::new(3));
        let snapshot: Vec<u32> = last.snapshot().iter().map(|v| **v).collect();
        assert_eq!(snapshot, vec![2, 3]);
    }
}
