use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::Key;
use crate::counter::Counters;
use crate::hash_table::address;

/// A fixed-capacity run of keys with an optional overflow chain.
///
/// Occupied keys always form the prefix `keys[..keys.len()]`; removal
/// compacts by swapping the last key into the hole, so key order within a
/// bucket carries no meaning.
///
/// A bucket only owns an overflow bucket while it is completely full, and an
/// overflow bucket is freed the moment it becomes empty. Every method below
/// preserves both rules, which is what lets `remove_last` always take keys from
/// the tail of the chain.
pub(crate) struct Bucket {
    keys: Vec<Key>,
    capacity: usize,
    overflow: Option<Box<Bucket>>,
}

impl Debug for Bucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        let mut bucket = Some(self);
        while let Some(b) = bucket {
            list.entry(&b.keys);
            bucket = b.overflow.as_deref();
        }
        list.finish()
    }
}

impl Clone for Bucket {
    fn clone(&self) -> Self {
        let mut keys = Vec::with_capacity(self.capacity);
        keys.extend_from_slice(&self.keys);
        Self {
            keys,
            capacity: self.capacity,
            overflow: self.overflow.clone(),
        }
    }
}

impl Bucket {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            keys: Vec::with_capacity(capacity),
            capacity,
            overflow: None,
        }
    }

    #[inline(always)]
    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline(always)]
    pub(crate) fn overflow(&self) -> Option<&Bucket> {
        self.overflow.as_deref()
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        self.keys.len() == self.capacity
    }

    /// Number of overflow buckets hanging off this one.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn chain_len(&self) -> usize {
        let mut len = 0;
        let mut overflow = self.overflow.as_deref();
        while let Some(bucket) = overflow {
            len += 1;
            overflow = bucket.overflow.as_deref();
        }
        len
    }

    /// Keys held across the whole chain.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn chain_keys(&self) -> usize {
        self.keys.len() + self.overflow.as_ref().map_or(0, |o| o.chain_keys())
    }

    /// Checks the compaction invariants of every bucket in the chain.
    #[cfg(test)]
    pub(crate) fn assert_compact(&self) {
        assert!(self.keys.len() <= self.capacity);
        if let Some(overflow) = &self.overflow {
            assert!(
                self.is_full(),
                "overflow attached to a bucket holding {}/{} keys",
                self.keys.len(),
                self.capacity
            );
            assert!(!overflow.keys.is_empty(), "empty overflow bucket kept alive");
            overflow.assert_compact();
        }
    }

    /// Position of `key` among this bucket's own keys.
    #[inline]
    fn position(&self, key: Key, counters: &mut Counters) -> Option<usize> {
        self.keys
            .iter()
            .position(|&stored| counters.compare(stored, key))
    }

    /// Inserts `key` unless the chain already holds it.
    ///
    /// Returns `true` if the key was added. A full bucket never spills into a
    /// neighbor: the key goes down this bucket's own overflow chain, which is
    /// grown by one bucket when needed.
    pub(crate) fn insert(&mut self, key: Key, counters: &mut Counters) -> bool {
        if self.position(key, counters).is_some() {
            return false;
        }

        if !self.is_full() {
            self.keys.push(key);
            return true;
        }

        let capacity = self.capacity;
        self.overflow
            .get_or_insert_with(|| {
                counters.allocate(capacity);
                Box::new(Bucket::new(capacity))
            })
            .insert(key, counters)
    }

    /// Removes and returns the last key of the chain.
    ///
    /// Returns `None` only when the chain is empty.
    pub(crate) fn remove_last(&mut self, counters: &mut Counters) -> Option<Key> {
        match self.overflow.as_deref_mut() {
            None => self.keys.pop(),
            Some(overflow) => {
                let key = overflow.remove_last(counters);
                self.release_empty_overflow(counters);
                key
            }
        }
    }

    pub(crate) fn search(&self, key: Key, counters: &mut Counters) -> bool {
        if self.position(key, counters).is_some() {
            return true;
        }

        match &self.overflow {
            Some(overflow) => overflow.search(key, counters),
            None => false,
        }
    }

    /// Deletes `key` from the chain, returning whether it was present.
    pub(crate) fn delete(&mut self, key: Key, counters: &mut Counters) -> bool {
        if let Some(index) = self.position(key, counters) {
            // Fill the hole from the tail of the chain so that a bucket with
            // overflow stays full.
            let tail = self
                .overflow
                .as_deref_mut()
                .and_then(|overflow| overflow.remove_last(counters));
            match tail {
                Some(tail) => self.keys[index] = tail,
                None => {
                    self.keys.swap_remove(index);
                }
            }
            self.release_empty_overflow(counters);
            return true;
        }

        let Some(overflow) = self.overflow.as_deref_mut() else {
            return false;
        };
        let removed = overflow.delete(key, counters);
        self.release_empty_overflow(counters);
        removed
    }

    /// Moves every key whose address under `modulus` is not `target` into
    /// `sibling`, then refills this bucket from its own overflow chain.
    ///
    /// Keys are relocated rather than re-added, so the table's key count is
    /// unaffected. Allocated slots change as `sibling` grows overflow buckets
    /// and as this chain frees the ones it no longer needs.
    pub(crate) fn split(
        &mut self,
        modulus: usize,
        target: usize,
        sibling: &mut Bucket,
        counters: &mut Counters,
    ) {
        let mut index = 0;
        while index < self.keys.len() {
            let key = self.keys[index];
            if address(key, modulus) == target {
                index += 1;
                continue;
            }

            self.keys.swap_remove(index);
            let moved = sibling.insert(key, counters);
            debug_assert!(moved, "key {key} already present in split sibling");
        }

        if let Some(overflow) = self.overflow.as_deref_mut() {
            overflow.split(modulus, target, sibling, counters);
        }
        self.release_empty_overflow(counters);

        while !self.is_full() {
            let Some(key) = self
                .overflow
                .as_deref_mut()
                .and_then(|overflow| overflow.remove_last(counters))
            else {
                break;
            };
            self.keys.push(key);
            self.release_empty_overflow(counters);
        }
    }

    /// Drains `other` into this chain, tail first.
    ///
    /// The caller is responsible for the slots of `other` itself; slots of its
    /// overflow buckets are released as they empty.
    pub(crate) fn merge(&mut self, mut other: Bucket, counters: &mut Counters) {
        while let Some(key) = other.remove_last(counters) {
            let moved = self.insert(key, counters);
            debug_assert!(moved, "key {key} present in both merged buckets");
        }
    }

    #[inline]
    fn release_empty_overflow(&mut self, counters: &mut Counters) {
        if self.overflow.as_ref().is_some_and(|o| o.keys.is_empty()) {
            debug_assert!(self.overflow.as_ref().is_some_and(|o| o.overflow.is_none()));
            self.overflow = None;
            counters.release(self.capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn chain(bucket: &Bucket) -> Vec<Vec<Key>> {
        let mut out = Vec::new();
        let mut next = Some(bucket);
        while let Some(b) = next {
            out.push(b.keys().to_vec());
            next = b.overflow();
        }
        out
    }

    fn sorted(bucket: &Bucket) -> Vec<Key> {
        let mut keys: Vec<Key> = chain(bucket).into_iter().flatten().collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn insert_fills_then_chains() {
        let mut counters = Counters::with_key_slots(2);
        let mut bucket = Bucket::new(2);

        assert!(bucket.insert(1, &mut counters));
        assert!(bucket.insert(2, &mut counters));
        assert_eq!(counters.key_slots, 2);
        assert!(bucket.overflow().is_none());

        assert!(bucket.insert(3, &mut counters));
        assert_eq!(counters.key_slots, 4);
        assert!(bucket.insert(4, &mut counters));
        assert!(bucket.insert(5, &mut counters));
        assert_eq!(counters.key_slots, 6);

        assert_eq!(chain(&bucket), vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(bucket.chain_len(), 2);
        bucket.assert_compact();
    }

    #[test]
    fn duplicate_insert_is_rejected_anywhere_in_chain() {
        let mut counters = Counters::with_key_slots(2);
        let mut bucket = Bucket::new(2);
        for key in [1, 2, 3] {
            assert!(bucket.insert(key, &mut counters));
        }

        counters.reset_comparisons();
        assert!(!bucket.insert(3, &mut counters));
        // Two misses in the primary bucket, one hit in the overflow bucket.
        assert_eq!(counters.comparisons, 3);
        assert_eq!(chain(&bucket), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn search_counts_comparisons_down_the_chain() {
        let mut counters = Counters::with_key_slots(3);
        let mut bucket = Bucket::new(3);
        for key in 10..17 {
            bucket.insert(key, &mut counters);
        }

        counters.reset_comparisons();
        assert!(bucket.search(10, &mut counters));
        assert_eq!(counters.comparisons, 1);

        counters.reset_comparisons();
        assert!(bucket.search(16, &mut counters));
        assert_eq!(counters.comparisons, 7);

        counters.reset_comparisons();
        assert!(!bucket.search(99, &mut counters));
        assert_eq!(counters.comparisons, 7);
    }

    #[test]
    fn remove_last_takes_from_tail_and_frees_overflow() {
        let mut counters = Counters::with_key_slots(2);
        let mut bucket = Bucket::new(2);
        for key in [1, 2, 3] {
            bucket.insert(key, &mut counters);
        }
        assert_eq!(counters.key_slots, 4);

        assert_eq!(bucket.remove_last(&mut counters), Some(3));
        assert!(bucket.overflow().is_none());
        assert_eq!(counters.key_slots, 2);

        assert_eq!(bucket.remove_last(&mut counters), Some(2));
        assert_eq!(bucket.remove_last(&mut counters), Some(1));
        assert_eq!(bucket.remove_last(&mut counters), None);
        assert_eq!(counters.key_slots, 2);
    }

    #[test]
    fn delete_without_overflow_swaps_last_into_hole() {
        let mut counters = Counters::with_key_slots(4);
        let mut bucket = Bucket::new(4);
        for key in [1, 2, 3, 4] {
            bucket.insert(key, &mut counters);
        }

        assert!(bucket.delete(1, &mut counters));
        assert_eq!(bucket.keys(), &[4, 2, 3]);
        assert!(!bucket.delete(1, &mut counters));
    }

    #[test]
    fn delete_with_overflow_refills_from_tail() {
        let mut counters = Counters::with_key_slots(2);
        let mut bucket = Bucket::new(2);
        for key in [1, 2, 3, 4, 5] {
            bucket.insert(key, &mut counters);
        }

        assert!(bucket.delete(1, &mut counters));
        assert_eq!(chain(&bucket), vec![vec![5, 2], vec![3, 4]]);
        assert_eq!(counters.key_slots, 4);
        bucket.assert_compact();

        assert!(bucket.delete(4, &mut counters));
        assert_eq!(chain(&bucket), vec![vec![5, 2], vec![3]]);

        assert!(bucket.delete(3, &mut counters));
        assert_eq!(chain(&bucket), vec![vec![5, 2]]);
        assert_eq!(counters.key_slots, 2);
        bucket.assert_compact();
    }

    #[test]
    fn split_relocates_by_address_and_recompacts() {
        let mut counters = Counters::with_key_slots(4);
        let mut bucket = Bucket::new(2);
        // All of these address bucket 0 under modulus 2.
        for key in [0, 2, 4, 6, 8, -10] {
            bucket.insert(key, &mut counters);
        }
        assert_eq!(bucket.chain_len(), 2);
        assert_eq!(counters.key_slots, 8);

        let mut sibling = Bucket::new(2);
        counters.reset_comparisons();
        bucket.split(4, 0, &mut sibling, &mut counters);

        assert_eq!(sorted(&bucket), vec![0, 4, 8]);
        assert_eq!(sorted(&sibling), vec![-10, 2, 6]);
        bucket.assert_compact();
        sibling.assert_compact();
        // Primary refilled, one overflow left on each side.
        assert_eq!(bucket.chain_len(), 1);
        assert_eq!(sibling.chain_len(), 1);
        assert_eq!(counters.key_slots, 8);
        // Inserting three keys into the sibling compares 0 + 1 + 2 times.
        assert_eq!(counters.comparisons, 3);
    }

    #[test]
    fn split_that_moves_everything_frees_the_chain() {
        let mut counters = Counters::with_key_slots(2);
        let mut bucket = Bucket::new(2);
        for key in [1, 3, 5] {
            bucket.insert(key, &mut counters);
        }

        let mut sibling = Bucket::new(2);
        bucket.split(2, 0, &mut sibling, &mut counters);

        assert!(bucket.keys().is_empty());
        assert!(bucket.overflow().is_none());
        assert_eq!(sorted(&sibling), vec![1, 3, 5]);
        // The source's overflow was freed and the sibling grew one.
        assert_eq!(counters.key_slots, 4);
    }

    #[test]
    fn merge_drains_other_chain() {
        let mut counters = Counters::with_key_slots(4);
        let mut bucket = Bucket::new(2);
        let mut other = Bucket::new(2);
        bucket.insert(1, &mut counters);
        for key in [2, 3, 4] {
            other.insert(key, &mut counters);
        }
        assert_eq!(counters.key_slots, 6);

        bucket.merge(other, &mut counters);

        assert_eq!(sorted(&bucket), vec![1, 2, 3, 4]);
        bucket.assert_compact();
        // The other overflow was freed, this bucket gained one.
        assert_eq!(counters.key_slots, 6);
        assert_eq!(bucket.chain_keys(), 4);
    }
}
