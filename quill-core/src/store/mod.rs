//! Credential store backends
//!
//! The OTP service only needs a handful of single-key operations with
//! per-key expiry. Any cache that offers them atomically per key can hold
//! pending credentials.

use crate::error::StoreError;
use std::time::Duration;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;

/// Key-value cache with per-key TTL
///
/// Every method is atomic for the key it touches. No cross-key
/// transactions are required.
pub trait CredentialStore: Send + Sync {
    /// Store `value` under `key`, replacing any existing entry
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch the live value under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`, returning whether a live entry was removed
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove `key` only if it currently holds `expected`
    ///
    /// Returns true for exactly one caller when several race on the same
    /// entry.
    fn delete_if_eq(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Increment the counter under `key`, creating it with `ttl` if absent
    fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError>;
}
