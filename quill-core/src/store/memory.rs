//! In-process credential store
//!
//! Entries live in a mutex-guarded map together with their deadline.
//! Expiry is passive: an entry past its deadline is treated as absent and
//! dropped the next time its key is touched.

use crate::error::StoreError;
use crate::store::CredentialStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Mutex-guarded in-memory [`CredentialStore`]
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going down or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Values of all live entries, for inspecting what the store holds
    pub fn raw_values(&self) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let entries = self.lock()?;
        Ok(entries
            .values()
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
            .collect())
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "Purged expired credential store entries");
        }
        Ok(purged)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "memory store marked unavailable".to_string(),
            });
        }
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Remove `key` if it has expired, returning the live entry otherwise
    fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

impl CredentialStore for MemoryStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.lock()?;
        Ok(Self::live(&mut entries, key).map(|entry| entry.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        let existed = Self::live(&mut entries, key).is_some();
        entries.remove(key);
        Ok(existed)
    }

    fn delete_if_eq(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        let matches = Self::live(&mut entries, key).is_some_and(|entry| entry.value == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }

    fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let mut entries = self.lock()?;
        if let Some(entry) = Self::live(&mut entries, key) {
            let next = entry.value.parse::<u64>().unwrap_or(0) + 1;
            entry.value = next.to_string();
            return Ok(next);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: "1".to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.set("otp:1", "abc", TTL).unwrap();

        assert_eq!(store.get("otp:1").unwrap(), Some("abc".to_string()));
        assert!(store.delete("otp:1").unwrap());
        assert_eq!(store.get("otp:1").unwrap(), None);
        assert!(!store.delete("otp:1").unwrap());
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("otp:1", "first", TTL).unwrap();
        store.set("otp:1", "second", TTL).unwrap();

        assert_eq!(store.get("otp:1").unwrap(), Some("second".to_string()));
        assert_eq!(store.raw_values().unwrap().len(), 1);
    }

    #[test]
    fn test_entries_expire() {
        let store = MemoryStore::new();
        store.set("otp:1", "abc", Duration::from_millis(20)).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(store.get("otp:1").unwrap(), None);
        assert!(!store.delete_if_eq("otp:1", "abc").unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("short", "a", Duration::from_millis(10)).unwrap();
        store.set("long", "b", TTL).unwrap();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.raw_values().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_delete_if_eq() {
        let store = MemoryStore::new();
        store.set("otp:1", "abc", TTL).unwrap();

        assert!(!store.delete_if_eq("otp:1", "xyz").unwrap());
        assert!(store.delete_if_eq("otp:1", "abc").unwrap());
        assert!(!store.delete_if_eq("otp:1", "abc").unwrap());
    }

    #[test]
    fn test_increment() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("n", TTL).unwrap(), 1);
        assert_eq!(store.increment("n", TTL).unwrap(), 2);
        assert_eq!(store.increment("n", TTL).unwrap(), 3);
    }

    #[test]
    fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(matches!(
            store.get("otp:1"),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.set("otp:1", "abc", TTL),
            Err(StoreError::Unavailable { .. })
        ));

        store.set_available(true);
        assert_eq!(store.get("otp:1").unwrap(), None);
    }
}
