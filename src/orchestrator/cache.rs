//! Bounded in-memory transfer store.
//!
//! Holds the most recent transfers in insertion order; when full, inserting
//! a new transfer evicts the oldest one. Updates do not refresh a
//! transfer's age.

use std::collections::{HashMap, VecDeque};

use crate::types::Transfer;

pub const DEFAULT_CAPACITY: usize = 1000;

pub struct TransferCache {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, Transfer>,
}

impl TransferCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a transfer, evicting the oldest entry if the cache is full.
    /// Returns the evicted transfer, if any.
    pub fn insert(&mut self, transfer: Transfer) -> Option<Transfer> {
        let id = transfer.id.clone();
        if self.entries.insert(id.clone(), transfer).is_some() {
            // Same id overwritten in place, age unchanged
            return None;
        }
        self.order.push_back(id);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            return self.entries.remove(&oldest);
        }
        None
    }

    pub fn get(&self, id: &str) -> Option<&Transfer> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Transfer> {
        self.entries.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cached transfers, oldest first
    pub fn values(&self) -> impl Iterator<Item = &Transfer> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TransferCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferKind;

    fn transfer(n: u64) -> Transfer {
        Transfer::new(
            TransferKind::Mint,
            "sourcenet",
            "targetnet",
            [1u8; 32],
            100,
            [2u8; 32],
            n,
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = TransferCache::new(10);
        let t = transfer(1);
        let id = t.id.clone();
        assert!(cache.insert(t).is_none());
        assert_eq!(cache.get(&id).unwrap().created_at, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let mut cache = TransferCache::new(3);
        let first = transfer(1);
        let first_id = first.id.clone();
        cache.insert(first);
        for n in 2..=3 {
            assert!(cache.insert(transfer(n)).is_none());
        }

        // Fourth insert pushes out the first
        let evicted = cache.insert(transfer(4)).unwrap();
        assert_eq!(evicted.id, first_id);
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&first_id).is_none());
    }

    #[test]
    fn test_thousand_and_first_entry_evicts_first() {
        let mut cache = TransferCache::default();
        let first = transfer(0);
        let first_id = first.id.clone();
        cache.insert(first);
        for n in 1..DEFAULT_CAPACITY as u64 {
            assert!(cache.insert(transfer(n)).is_none());
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);

        let evicted = cache.insert(transfer(DEFAULT_CAPACITY as u64)).unwrap();
        assert_eq!(evicted.id, first_id);
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = TransferCache::new(2);
        let a = transfer(1);
        let a_id = a.id.clone();
        cache.insert(a.clone());
        cache.insert(transfer(2));

        let mut updated = a;
        updated.amount = 999;
        assert!(cache.insert(updated).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a_id).unwrap().amount, 999);
    }
}
