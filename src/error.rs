//! Errors reported while configuring a [`LinearHashTable`].
//!
//! [`LinearHashTable`]: crate::LinearHashTable

/// A rejected table configuration.
///
/// Key-level outcomes (a duplicate insert, a missing key on search or delete)
/// are never errors; they are reported through the `bool` results of the table
/// operations. The only fallible step is building the table itself.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Buckets must be able to hold at least one key.
    #[error("bucket capacity must be at least 1")]
    ZeroBucketCapacity,

    /// The directory must start with at least one bucket.
    #[error("initial bucket count must be at least 1")]
    ZeroInitialBuckets,

    /// A load factor threshold is not a finite value in `(0, 1]`.
    #[error("{name} must be in (0, 1], got {value}")]
    LoadFactorOutOfRange {
        /// Which threshold was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The merge threshold sits above the split threshold.
    #[error("min_load_factor ({min}) must not exceed max_load_factor ({max})")]
    InvertedLoadFactors {
        /// The requested merge threshold.
        min: f64,
        /// The requested split threshold.
        max: f64,
    },
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = ConfigError::LoadFactorOutOfRange {
            name: "max_load_factor",
            value: 1.5,
        };
        assert_eq!(err.to_string(), "max_load_factor must be in (0, 1], got 1.5");

        let err = ConfigError::InvertedLoadFactors { min: 0.9, max: 0.5 };
        assert_eq!(
            err.to_string(),
            "min_load_factor (0.9) must not exceed max_load_factor (0.5)"
        );
    }
}
