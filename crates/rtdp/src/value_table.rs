//! Sparse state-value table.
//!
//! Entries appear only when a value is first requested or written; nothing
//! is ever removed.

use std::collections::HashMap;
use std::hash::Hash;

/// Mapping from state to estimated value.
#[derive(Clone, Debug)]
pub struct ValueTable<S> {
    values: HashMap<S, f64>,
}

impl<S: Eq + Hash> ValueTable<S> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Current estimate, if the state has one.
    pub fn get(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// Current estimate, seeding it from `init` on first access.
    pub fn get_or_insert_with(&mut self, state: &S, init: impl FnOnce(&S) -> f64) -> f64
    where
        S: Clone,
    {
        if let Some(v) = self.values.get(state) {
            return *v;
        }
        let v = init(state);
        self.values.insert(state.clone(), v);
        v
    }

    pub fn set(&mut self, state: S, value: f64) {
        self.values.insert(state, value);
    }

    pub fn contains(&self, state: &S) -> bool {
        self.values.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.values.iter().map(|(s, v)| (s, *v))
    }
}

impl<S: Eq + Hash> Default for ValueTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let table: ValueTable<u8> = ValueTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get(&1), None);
        assert!(!table.contains(&1));
    }

    #[test]
    fn test_lazy_seed_runs_once() {
        let mut table = ValueTable::new();
        let mut calls = 0;

        let v = table.get_or_insert_with(&7u8, |s| {
            calls += 1;
            *s as f64 * 2.0
        });
        assert_eq!(v, 14.0);

        let v = table.get_or_insert_with(&7u8, |_| {
            calls += 1;
            -1.0
        });
        assert_eq!(v, 14.0);
        assert_eq!(calls, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = ValueTable::new();
        table.set('a', 1.0);
        table.set('a', 2.5);
        assert_eq!(table.get(&'a'), Some(2.5));
        assert_eq!(table.iter().count(), 1);
    }
}
