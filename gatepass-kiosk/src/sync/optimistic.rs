//! Per-key optimistic mutation ledger
//!
//! snapshot -> apply -> commit -> reconcile or roll back, tracked per key so
//! a rollback only ever restores the value captured for its own key.

use std::collections::HashMap;
use std::hash::Hash;

/// A mutation applied locally and not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<V> {
    pub previous: V,
    pub applied: V,
}

/// Key already has a mutation in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a mutation is already in flight for this entry")]
pub struct AlreadyPending;

#[derive(Debug)]
pub struct OptimisticLedger<K, V> {
    pending: HashMap<K, Pending<V>>,
}

impl<K, V> Default for OptimisticLedger<K, V> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> OptimisticLedger<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `previous -> applied` for `key`; one mutation per key at a time
    pub fn begin(&mut self, key: K, previous: V, applied: V) -> Result<(), AlreadyPending> {
        if self.pending.contains_key(&key) {
            return Err(AlreadyPending);
        }
        self.pending.insert(key, Pending { previous, applied });
        Ok(())
    }

    /// Store confirmed the mutation
    pub fn commit(&mut self, key: &K) -> Option<Pending<V>> {
        self.pending.remove(key)
    }

    /// Store rejected the mutation; `current` is reset to the snapshot only
    /// if it still holds the optimistic value
    pub fn rollback(&mut self, key: &K, current: Option<&mut V>) -> Option<V> {
        let pending = self.pending.remove(key)?;
        match current {
            Some(value) if *value == pending.applied => {
                *value = pending.previous.clone();
                Some(pending.previous)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Re-apply in-flight values on top of freshly loaded data
    pub fn overlay<'a, I>(&self, entries: I)
    where
        I: IntoIterator<Item = (&'a K, &'a mut V)>,
        K: 'a,
        V: 'a,
    {
        for (key, value) in entries {
            if let Some(pending) = self.pending.get(key) {
                *value = pending.applied.clone();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_mutation_per_key() {
        let mut ledger = OptimisticLedger::new();
        ledger.begin("a", 1, 2).unwrap();
        assert_eq!(ledger.begin("a", 2, 3), Err(AlreadyPending));
        ledger.begin("b", 5, 6).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_rollback_restores_only_own_key() {
        let mut ledger = OptimisticLedger::new();
        let mut a = 1;
        let mut b = 10;

        ledger.begin("a", a, 2).unwrap();
        a = 2;
        ledger.begin("b", b, 20).unwrap();
        b = 20;

        assert_eq!(ledger.rollback(&"a", Some(&mut a)), Some(1));
        assert_eq!(a, 1);
        assert_eq!(b, 20);
        assert!(ledger.is_pending(&"b"));

        assert!(ledger.commit(&"b").is_some());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_rollback_skips_overwritten_value() {
        let mut ledger = OptimisticLedger::new();
        ledger.begin("a", 1, 2).unwrap();
        let mut a = 7;
        assert_eq!(ledger.rollback(&"a", Some(&mut a)), None);
        assert_eq!(a, 7);
        assert!(!ledger.is_pending(&"a"));
    }

    #[test]
    fn test_overlay() {
        let mut ledger = OptimisticLedger::new();
        ledger.begin(1u32, 'x', 'y').unwrap();
        let keys = [1u32, 2u32];
        let mut values = ['x', 'q'];
        ledger.overlay(keys.iter().zip(values.iter_mut()));
        assert_eq!(values, ['y', 'q']);
    }
}
