use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use crate::Key;
use crate::bucket::Bucket;
use crate::config::Config;
use crate::counter::Counters;
use crate::error::ConfigError;

/// Bucket index of `key` under `modulus`.
///
/// Uses the truncated remainder with its sign dropped, so `k` and `-k` share
/// a bucket. For any modulus `m`, `address(k, 2 * m)` is either
/// `address(k, m)` or `address(k, m) + m`, which is what lets a split move
/// keys into exactly one new bucket.
#[inline(always)]
pub(crate) fn address(key: Key, modulus: usize) -> usize {
    debug_assert!(modulus > 0);
    (key % modulus as Key).unsigned_abs() as usize
}

/// Chain statistics for a hash table.
///
/// Available with the `stats` feature, and always under `cfg(test)`.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of keys currently in the table
    pub populated: usize,
    /// Key slots across every allocated bucket
    pub capacity: usize,
    /// Number of buckets in the directory
    pub bucket_count: usize,
    /// Number of overflow buckets across all chains
    pub overflow_buckets: usize,
    /// Number of keys stored in overflow buckets
    pub overflow_keys: usize,
    /// Overflow buckets in the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Index of the next bucket to split
    pub split_pointer: usize,
    /// Modulus of the current round
    pub hash_modulus: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Linear Hash Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Directory: {} buckets (round modulus {}, next split {})",
            self.bucket_count, self.hash_modulus, self.split_pointer
        );
        println!(
            "Overflow: {} buckets holding {} keys ({:.2}% of keys)",
            self.overflow_buckets,
            self.overflow_keys,
            if self.populated == 0 {
                0.0
            } else {
                (self.overflow_keys as f64 / self.populated as f64) * 100.0
            }
        );
        println!("Longest chain: {} overflow buckets", self.longest_chain);
    }
}

/// A hash table of `i64` keys using linear hashing.
///
/// Keys live in a directory of fixed-capacity buckets. A bucket that fills up
/// grows a chain of overflow buckets instead of forcing a resize. When the
/// load factor (keys divided by allocated key slots) rises above the
/// configured maximum, the table splits exactly one bucket, the one under the
/// split pointer, and appends its sibling to the directory. When a delete
/// drops the load factor below the minimum, the most recent split is undone.
/// Growth and shrinkage therefore cost one bucket's worth of work per
/// operation; there is never a whole-table rehash.
///
/// The table has set semantics: inserting a key that is already present
/// changes nothing.
///
/// Every public operation resets and then accumulates a count of the key
/// comparisons it performed, available through [`comparisons`].
///
/// [`comparisons`]: LinearHashTable::comparisons
///
/// ## Example
///
/// ```rust
/// use linear_hash::LinearHashTable;
///
/// let mut table = LinearHashTable::new(2, 2).unwrap();
/// for key in [4, 9, 14, 20, 1] {
///     table.insert(key);
/// }
///
/// assert!(table.search(20));
/// assert!(!table.search(7));
/// assert_eq!(table.len(), 5);
/// assert_eq!(table.bucket_count(), 3);
///
/// table.delete(20);
/// assert!(!table.search(20));
/// println!("last search compared {} keys", table.comparisons());
/// ```
#[derive(Clone)]
pub struct LinearHashTable {
    directory: Vec<Bucket>,
    config: Config,

    populated: usize,
    counters: Counters,

    split_pointer: usize,
    hash_modulus: usize,
}

impl Debug for LinearHashTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinearHashTable")
            .field("directory", &self.directory)
            .field("populated", &self.populated)
            .field("capacity", &self.counters.key_slots)
            .field("split_pointer", &self.split_pointer)
            .field("hash_modulus", &self.hash_modulus)
            .finish()
    }
}

impl Default for LinearHashTable {
    /// A table built from [`Config::default`].
    fn default() -> Self {
        Self::build(Config::default())
    }
}

impl LinearHashTable {
    /// Creates a table of `initial_buckets` buckets holding `bucket_capacity`
    /// keys each, with the default load factor thresholds (0.8 and 0.5).
    ///
    /// # Errors
    ///
    /// Returns an error if either argument is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::ConfigError;
    /// use linear_hash::LinearHashTable;
    ///
    /// let table = LinearHashTable::new(10, 100).unwrap();
    /// assert_eq!(table.capacity(), 1000);
    ///
    /// assert_eq!(
    ///     LinearHashTable::new(0, 100).unwrap_err(),
    ///     ConfigError::ZeroBucketCapacity
    /// );
    /// ```
    pub fn new(bucket_capacity: usize, initial_buckets: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(bucket_capacity, initial_buckets))
    }

    /// Creates a table from a full [`Config`].
    ///
    /// # Errors
    ///
    /// Returns the first problem reported by [`Config::validate`].
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            warn!("rejected table configuration {:?}: {}", config, err);
            return Err(err);
        }
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let directory = (0..config.initial_buckets)
            .map(|_| Bucket::new(config.bucket_capacity))
            .collect();

        Self {
            directory,
            config,
            populated: 0,
            counters: Counters::with_key_slots(config.bucket_capacity * config.initial_buckets),
            split_pointer: 0,
            hash_modulus: config.initial_buckets,
        }
    }

    /// Inserts a key, returning whether it was newly added.
    ///
    /// If the load factor afterwards exceeds the maximum, one bucket is split.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(4, 4).unwrap();
    /// assert!(table.insert(-17));
    /// assert!(!table.insert(-17));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, key: Key) -> bool {
        self.counters.reset_comparisons();

        let index = self.bucket_for(key);
        let inserted = self.directory[index].insert(key, &mut self.counters);
        if inserted {
            self.populated += 1;
        }

        if self.load_factor() > self.config.max_load_factor {
            self.split();
        }

        inserted
    }

    /// Returns `true` if the table holds `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(4, 4).unwrap();
    /// table.insert(i64::MIN);
    /// assert!(table.search(i64::MIN));
    /// assert!(!table.search(0));
    /// ```
    pub fn search(&mut self, key: Key) -> bool {
        self.counters.reset_comparisons();

        let index = self.bucket_for(key);
        self.directory[index].search(key, &mut self.counters)
    }

    /// Deletes a key, returning whether it was present.
    ///
    /// If the load factor afterwards is below the minimum and the directory is
    /// larger than it was at construction, the most recent split is undone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(4, 4).unwrap();
    /// table.insert(8);
    /// assert!(table.delete(8));
    /// assert!(!table.delete(8));
    /// assert!(table.is_empty());
    /// ```
    pub fn delete(&mut self, key: Key) -> bool {
        self.counters.reset_comparisons();

        let index = self.bucket_for(key);
        let removed = self.directory[index].delete(key, &mut self.counters);
        if removed {
            self.populated -= 1;
        }

        // A delete cannot raise the load factor by itself, but a merge can
        // leave the table above the split threshold when the two thresholds
        // are close together.
        let load_factor = self.load_factor();
        if load_factor > self.config.max_load_factor {
            self.split();
        } else if load_factor < self.config.min_load_factor
            && self.directory.len() > self.config.initial_buckets
        {
            self.merge();
        }

        removed
    }

    /// Key comparisons performed by the most recent `insert`, `search` or
    /// `delete`, including those made while splitting or merging buckets.
    ///
    /// The count is reset at the start of each of those calls; callers that
    /// want totals must add the value up between calls.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(4, 1).unwrap();
    /// table.insert(1);
    /// table.insert(2);
    /// table.search(2);
    /// assert_eq!(table.comparisons(), 2);
    /// ```
    pub fn comparisons(&self) -> u64 {
        self.counters.comparisons
    }

    /// Resets the comparison count to zero.
    pub fn reset_comparisons(&mut self) {
        self.counters.reset_comparisons();
    }

    /// Returns the number of keys in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no keys.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of key slots across every allocated bucket,
    /// overflow buckets included.
    ///
    /// This is the denominator of [`load_factor`](Self::load_factor); a table
    /// whose keys pile into a few long chains has a large capacity even though
    /// most directory buckets are nearly empty.
    pub fn capacity(&self) -> usize {
        self.counters.key_slots
    }

    /// Returns the ratio of stored keys to allocated key slots.
    pub fn load_factor(&self) -> f64 {
        self.populated as f64 / self.counters.key_slots as f64
    }

    /// Returns the number of buckets in the directory.
    pub fn bucket_count(&self) -> usize {
        self.directory.len()
    }

    /// Returns the number of keys each bucket holds.
    pub fn bucket_capacity(&self) -> usize {
        self.config.bucket_capacity
    }

    /// Returns the directory size below which the table never merges.
    pub fn min_bucket_count(&self) -> usize {
        self.config.initial_buckets
    }

    /// Returns the index of the next bucket to split.
    pub fn split_pointer(&self) -> usize {
        self.split_pointer
    }

    /// Returns the modulus used for first-tier addressing in this round.
    pub fn hash_modulus(&self) -> usize {
        self.hash_modulus
    }

    /// Returns the configuration the table is running with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Changes the split threshold.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if `factor` is not in `(0, 1]` or is
    /// below the current merge threshold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(10, 100).unwrap();
    /// table.set_max_load_factor(0.5).unwrap();
    /// assert!(table.set_max_load_factor(0.4).is_err());
    /// ```
    pub fn set_max_load_factor(&mut self, factor: f64) -> Result<(), ConfigError> {
        self.retune(self.config.max_load_factor(factor))
    }

    /// Changes the merge threshold.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if `factor` is not in `(0, 1]` or is
    /// above the current split threshold.
    pub fn set_min_load_factor(&mut self, factor: f64) -> Result<(), ConfigError> {
        self.retune(self.config.min_load_factor(factor))
    }

    fn retune(&mut self, config: Config) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            warn!("rejected load factor change {:?}: {}", config, err);
            return Err(err);
        }
        self.config = config;
        Ok(())
    }

    /// Removes every key and returns the directory to its initial shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(1, 2).unwrap();
    /// table.extend(0..100);
    /// assert!(table.bucket_count() > 2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.bucket_count(), 2);
    /// assert_eq!(table.capacity(), 2);
    /// ```
    pub fn clear(&mut self) {
        *self = Self::build(self.config);
    }

    /// Returns an iterator over every key in the table.
    ///
    /// Keys are yielded bucket by bucket in directory order, each bucket
    /// followed by its overflow chain. Within a bucket the order reflects
    /// insertions and swap-compacting deletes, so it should not be relied on.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::LinearHashTable;
    ///
    /// let mut table = LinearHashTable::new(2, 2).unwrap();
    /// table.extend([3, 1, 2]);
    ///
    /// let mut keys: Vec<i64> = table.iter().copied().collect();
    /// keys.sort();
    /// assert_eq!(keys, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            directory: self.directory.iter(),
            bucket: None,
            slot: 0,
            remaining: self.populated,
        }
    }

    /// Directory index of the bucket responsible for `key`.
    ///
    /// Buckets below the split pointer have already been split this round, so
    /// their keys are addressed with the next round's modulus.
    #[inline]
    fn bucket_for(&self, key: Key) -> usize {
        let index = address(key, self.hash_modulus);
        if index >= self.split_pointer {
            index
        } else {
            address(key, self.hash_modulus * 2)
        }
    }

    fn split(&mut self) {
        let capacity = self.config.bucket_capacity;
        let modulus = self.hash_modulus * 2;
        let target = self.split_pointer;

        let mut sibling = Bucket::new(capacity);
        self.counters.allocate(capacity);
        self.directory[target].split(modulus, target, &mut sibling, &mut self.counters);
        self.directory.push(sibling);

        trace!(
            "split bucket {} into bucket {}",
            target,
            self.directory.len() - 1
        );

        if self.directory.len() == modulus {
            self.hash_modulus = modulus;
            self.split_pointer = 0;
            debug!("split round complete, hash modulus now {}", modulus);
        } else {
            self.split_pointer += 1;
        }
    }

    fn merge(&mut self) {
        debug_assert!(self.directory.len() > self.config.initial_buckets);

        if self.split_pointer == 0 {
            self.hash_modulus = self.directory.len() / 2;
            self.split_pointer = self.hash_modulus - 1;
            debug!(
                "merge round started, hash modulus now {}",
                self.hash_modulus
            );
        } else {
            self.split_pointer -= 1;
        }

        let Some(removed) = self.directory.pop() else {
            return;
        };
        self.counters.release(self.config.bucket_capacity);
        self.directory[self.split_pointer].merge(removed, &mut self.counters);

        trace!(
            "merged bucket {} into bucket {}",
            self.directory.len(),
            self.split_pointer
        );
    }

    /// Returns how many directory buckets have each overflow chain length.
    ///
    /// Index `n` of the result counts the buckets with exactly `n` overflow
    /// buckets; index 0 counts the buckets without overflow. The result has
    /// one entry more than the longest chain.
    ///
    /// Available with the `stats` feature, and always under `cfg(test)`.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for bucket in &self.directory {
            let len = bucket.chain_len();
            if len >= hist.len() {
                hist.resize(len + 1, 0);
            }
            hist[len] += 1;
        }
        hist
    }

    /// Returns a snapshot of chain and directory statistics.
    ///
    /// Available with the `stats` feature, and always under `cfg(test)`.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mut overflow_buckets = 0;
        let mut overflow_keys = 0;
        let mut longest_chain = 0;
        for bucket in &self.directory {
            let len = bucket.chain_len();
            overflow_buckets += len;
            longest_chain = longest_chain.max(len);
            overflow_keys += bucket.chain_keys() - bucket.keys().len();
        }

        DebugStats {
            populated: self.populated,
            capacity: self.counters.key_slots,
            bucket_count: self.directory.len(),
            overflow_buckets,
            overflow_keys,
            longest_chain,
            load_factor: self.load_factor(),
            split_pointer: self.split_pointer,
            hash_modulus: self.hash_modulus,
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    ///
    /// Requires the `std` feature, and `stats` outside of tests.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("chain histogram ({} buckets):", self.directory.len());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (len, &count) in hist.iter().enumerate() {
            println!("{:>2} | {} ({})", len, make_bar(count), count);
        }
    }

    /// Checks every structural invariant of the table.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.split_pointer < self.hash_modulus);
        assert_eq!(self.directory.len(), self.hash_modulus + self.split_pointer);
        assert!(self.directory.len() >= self.config.initial_buckets);

        let mut keys = 0;
        let mut slots = 0;
        for (index, bucket) in self.directory.iter().enumerate() {
            bucket.assert_compact();
            keys += bucket.chain_keys();
            slots += (1 + bucket.chain_len()) * self.config.bucket_capacity;

            let mut link = Some(bucket);
            while let Some(b) = link {
                for &key in b.keys() {
                    assert_eq!(self.bucket_for(key), index, "key {key} is misplaced");
                }
                link = b.overflow();
            }
        }
        assert_eq!(keys, self.populated);
        assert_eq!(slots, self.counters.key_slots);
    }
}

impl Extend<Key> for LinearHashTable {
    fn extend<I: IntoIterator<Item = Key>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a> Extend<&'a Key> for LinearHashTable {
    fn extend<I: IntoIterator<Item = &'a Key>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a> IntoIterator for &'a LinearHashTable {
    type IntoIter = Iter<'a>;
    type Item = &'a Key;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the keys of a [`LinearHashTable`].
///
/// This struct is created by the [`iter`] method on [`LinearHashTable`].
///
/// [`iter`]: LinearHashTable::iter
pub struct Iter<'a> {
    directory: core::slice::Iter<'a, Bucket>,
    bucket: Option<&'a Bucket>,
    slot: usize,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Key;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(bucket) = self.bucket {
                if let Some(key) = bucket.keys().get(self.slot) {
                    self.slot += 1;
                    self.remaining -= 1;
                    return Some(key);
                }
                self.bucket = bucket.overflow();
                self.slot = 0;
                if self.bucket.is_some() {
                    continue;
                }
            }

            self.bucket = Some(self.directory.next()?);
            self.slot = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
