#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// The key type stored by the table.
///
/// Every `i64` is a valid key, including negative values and the extremes of
/// the range; the address function normalizes the sign of the remainder.
pub type Key = i64;

cfg_if::cfg_if! {
    if #[cfg(feature = "logging")] {
        macro_rules! trace {
            ($($arg:tt)*) => { log::trace!(target: "linear_hash", $($arg)*) };
        }

        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!(target: "linear_hash", $($arg)*) };
        }

        macro_rules! warn {
            ($($arg:tt)*) => { log::warn!(target: "linear_hash", $($arg)*) };
        }
    } else {
        macro_rules! trace {
            ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } };
        }

        macro_rules! debug {
            ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } };
        }

        macro_rules! warn {
            ($($arg:tt)*) => { { let _ = format_args!($($arg)*); } };
        }
    }
}

mod bucket;
mod counter;

/// Construction parameters and their validation.
pub mod config;

pub mod error;

/// A linear hash table of integer keys.
///
/// This module provides [`LinearHashTable`], which grows and shrinks its
/// bucket directory one bucket at a time, and the iterator and statistics
/// types that go with it.
pub mod hash_table;

pub use config::Config;
pub use error::ConfigError;
pub use hash_table::LinearHashTable;
