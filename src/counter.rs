use crate::Key;

/// Bookkeeping shared between the table and its bucket chains.
///
/// The table owns a single `Counters` and lends it by `&mut` to every bucket
/// operation, so the only places that change these numbers are the bucket
/// methods that compare keys, allocate an overflow bucket, or free one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    /// Key comparisons made since the last reset.
    pub(crate) comparisons: u64,
    /// Key slots across every allocated bucket, overflow buckets included.
    pub(crate) key_slots: usize,
}

impl Counters {
    pub(crate) fn with_key_slots(key_slots: usize) -> Self {
        Self {
            comparisons: 0,
            key_slots,
        }
    }

    #[inline(always)]
    pub(crate) fn reset_comparisons(&mut self) {
        self.comparisons = 0;
    }

    #[inline(always)]
    pub(crate) fn compare(&mut self, stored: Key, key: Key) -> bool {
        self.comparisons += 1;
        stored == key
    }

    #[inline(always)]
    pub(crate) fn allocate(&mut self, bucket_capacity: usize) {
        self.key_slots += bucket_capacity;
    }

    #[inline(always)]
    pub(crate) fn release(&mut self, bucket_capacity: usize) {
        debug_assert!(self.key_slots >= bucket_capacity);
        self.key_slots -= bucket_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_counts_every_probe() {
        let mut counters = Counters::default();
        assert!(!counters.compare(1, 2));
        assert!(counters.compare(3, 3));
        assert_eq!(counters.comparisons, 2);

        counters.reset_comparisons();
        assert_eq!(counters.comparisons, 0);
    }

    #[test]
    fn slots_follow_allocations() {
        let mut counters = Counters::with_key_slots(8);
        counters.allocate(4);
        assert_eq!(counters.key_slots, 12);
        counters.release(4);
        counters.release(4);
        assert_eq!(counters.key_slots, 4);
    }
}
