use crate::error::ConfigError;

/// Split threshold used when none is configured.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.8;

/// Merge threshold used when none is configured.
pub const DEFAULT_MIN_LOAD_FACTOR: f64 = 0.5;

/// Construction parameters for a [`LinearHashTable`].
///
/// The geometry (`bucket_capacity`, `initial_buckets`) is fixed for the life
/// of the table: every bucket, including overflow buckets, holds
/// `bucket_capacity` keys, and the directory never shrinks below
/// `initial_buckets`. The load factor thresholds decide when the table splits
/// and merges buckets.
///
/// # Examples
///
/// ```rust
/// use linear_hash::Config;
/// use linear_hash::LinearHashTable;
///
/// let config = Config::new(4, 8)
///     .max_load_factor(0.75)
///     .min_load_factor(0.25);
/// let table = LinearHashTable::with_config(config).unwrap();
/// assert_eq!(table.bucket_count(), 8);
/// assert_eq!(table.capacity(), 32);
/// ```
///
/// [`LinearHashTable`]: crate::LinearHashTable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub(crate) bucket_capacity: usize,
    pub(crate) initial_buckets: usize,
    pub(crate) max_load_factor: f64,
    pub(crate) min_load_factor: f64,
}

impl Default for Config {
    /// Ten keys per bucket across one hundred buckets.
    fn default() -> Self {
        Self::new(10, 100)
    }
}

impl Config {
    /// Creates a configuration with the default load factor thresholds.
    pub fn new(bucket_capacity: usize, initial_buckets: usize) -> Self {
        Self {
            bucket_capacity,
            initial_buckets,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            min_load_factor: DEFAULT_MIN_LOAD_FACTOR,
        }
    }

    /// Sets the load factor above which an operation splits one bucket.
    pub fn max_load_factor(mut self, factor: f64) -> Self {
        self.max_load_factor = factor;
        self
    }

    /// Sets the load factor below which a delete merges one bucket.
    pub fn min_load_factor(mut self, factor: f64) -> Self {
        self.min_load_factor = factor;
        self
    }

    /// Keys held by each bucket.
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Directory size at construction, which is also the merge floor.
    pub fn initial_buckets(&self) -> usize {
        self.initial_buckets
    }

    /// Checks every parameter, returning the first problem found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linear_hash::Config;
    /// use linear_hash::ConfigError;
    ///
    /// assert_eq!(Config::new(0, 4).validate(), Err(ConfigError::ZeroBucketCapacity));
    /// assert!(Config::new(2, 4).validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_capacity == 0 {
            return Err(ConfigError::ZeroBucketCapacity);
        }
        if self.initial_buckets == 0 {
            return Err(ConfigError::ZeroInitialBuckets);
        }
        check_factor("max_load_factor", self.max_load_factor)?;
        check_factor("min_load_factor", self.min_load_factor)?;
        if self.min_load_factor > self.max_load_factor {
            return Err(ConfigError::InvertedLoadFactors {
                min: self.min_load_factor,
                max: self.max_load_factor,
            });
        }
        Ok(())
    }
}

fn check_factor(name: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons.
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::LoadFactorOutOfRange { name, value })
    }
}
