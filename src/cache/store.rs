//! Expiring key-value store
//!
//! Wraps a [`StorageMedium`] so that every value carries the time it was
//! written and how long it stays valid. Reads past expiry behave as a miss
//! and evict the entry.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::medium::StorageMedium;
use crate::error::Result;

/// TTL applied by [`ExpiringStore::set_default`]
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Wrapper stored for every key
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    written_at: DateTime<Utc>,
    /// Lifetime in milliseconds; `None` never expires
    ttl_ms: Option<i64>,
}

impl<T> CacheEntry<T> {
    /// `None` when the stored TTL is outside the range chrono can represent
    fn is_expired(&self, now: DateTime<Utc>) -> Option<bool> {
        match self.ttl_ms {
            Some(ttl_ms) => {
                let ttl = Duration::try_milliseconds(ttl_ms)?;
                Some(now - self.written_at > ttl)
            }
            None => Some(false),
        }
    }
}

/// Entry header, read without deserializing the value
#[derive(Debug, Deserialize)]
struct EntryHeader {
    written_at: DateTime<Utc>,
}

/// Reads and writes TTL-wrapped JSON values on a storage medium
#[derive(Debug, Clone)]
pub struct ExpiringStore {
    medium: Arc<dyn StorageMedium>,
    clock: Arc<dyn Clock>,
}

impl ExpiringStore {
    /// Creates a store on `medium` using the system clock
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self::with_clock(medium, Arc::new(SystemClock))
    }

    /// Creates a store with a custom clock
    ///
    /// Useful for testing expiry without waiting.
    pub fn with_clock(medium: Arc<dyn StorageMedium>, clock: Arc<dyn Clock>) -> Self {
        Self { medium, clock }
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Stores `value` under `key`, valid for `ttl` from now
    ///
    /// # Arguments
    /// * `key` - Any string; overwrites an existing entry and resets its age
    /// * `value` - The data to store (must implement Serialize)
    /// * `ttl` - How long reads should return the value
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if serialization or the medium write fails
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.write(key, value, Some(ttl.num_milliseconds()))
    }

    /// Stores `value` with the 24 hour default TTL
    pub fn set_default<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, value, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Stores `value` with no expiry
    pub fn persist<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write(key, value, None)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T, ttl_ms: Option<i64>) -> Result<()> {
        let entry = CacheEntry {
            value,
            written_at: self.clock.now(),
            ttl_ms,
        };
        let json = serde_json::to_string(&entry)?;
        self.medium.set_item(key, &json)?;
        Ok(())
    }

    /// Reads the value under `key`
    ///
    /// Returns `None` when the key is missing, expired (the entry is removed),
    /// or cannot be parsed as `T` (the entry is left in place).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.medium.get_item(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, error = %e, "unreadable cache entry");
                return None;
            }
        };

        let Some(expired) = entry.is_expired(self.clock.now()) else {
            tracing::debug!(key, ttl_ms = ?entry.ttl_ms, "unreadable cache entry ttl");
            return None;
        };
        if expired {
            tracing::debug!(key, "cache entry expired");
            if let Err(e) = self.medium.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to evict expired entry");
            }
            return None;
        }

        Some(entry.value)
    }

    /// Deletes `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        self.medium.remove_item(key)?;
        Ok(())
    }

    /// Deletes every entry, durable ones included
    pub fn clear(&self) -> Result<()> {
        self.medium.clear()?;
        Ok(())
    }

    /// True when [`get`](Self::get) would return a value
    pub fn has(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key).is_some()
    }

    /// Every stored key in sorted order, expired entries included
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.medium.keys()?)
    }

    /// Number of stored keys, expired or not
    pub fn size(&self) -> Result<usize> {
        Ok(self.medium.len()?)
    }

    /// Removes every entry under `prefix` written more than `max_age` ago
    ///
    /// Ignores each entry's own TTL. Entries that cannot be parsed are left
    /// alone. Returns how many entries were removed.
    pub fn sweep(&self, prefix: &str, max_age: Duration) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for key in self.medium.keys()? {
            if !key.starts_with(prefix) {
                continue;
            }
            let Some(raw) = self.medium.get_item(&key)? else {
                continue;
            };
            let Ok(header) = serde_json::from_str::<EntryHeader>(&raw) else {
                continue;
            };
            if now - header.written_at > max_age {
                self.medium.remove_item(&key)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(prefix, removed, "swept stale entries");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::medium::{FileMedium, MemoryMedium};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn test_data(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    fn create_test_store() -> (ExpiringStore, Arc<MemoryMedium>, Arc<ManualClock>) {
        let medium = Arc::new(MemoryMedium::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = ExpiringStore::with_clock(medium.clone(), clock.clone());
        (store, medium, clock)
    }

    #[test]
    fn test_get_returns_value_before_ttl() {
        let (store, _medium, clock) = create_test_store();
        let data = test_data("fresh", 1);
        store.set("k", &data, Duration::minutes(30)).unwrap();

        clock.advance(Duration::minutes(29));

        assert_eq!(store.get::<TestData>("k"), Some(data));
    }

    #[test]
    fn test_get_at_exact_ttl_is_still_valid() {
        let (store, _medium, clock) = create_test_store();
        store.set("k", &1, Duration::minutes(30)).unwrap();

        clock.advance(Duration::minutes(30));

        assert_eq!(store.get::<i32>("k"), Some(1));
    }

    #[test]
    fn test_expired_read_is_absent_and_evicts() {
        let (store, medium, clock) = create_test_store();
        store.set("k", &test_data("old", 2), Duration::minutes(30)).unwrap();

        clock.advance(Duration::minutes(31));

        assert_eq!(store.get::<TestData>("k"), None);
        assert_eq!(medium.get_item("k").unwrap(), None, "expired entry should be removed");
    }

    #[test]
    fn test_set_default_uses_24_hours() {
        let (store, _medium, clock) = create_test_store();
        store.set_default("k", &"v").unwrap();

        clock.advance(Duration::hours(23));
        assert!(store.has("k"));

        clock.advance(Duration::hours(2));
        assert!(!store.has("k"));
    }

    #[test]
    fn test_persisted_entries_never_expire() {
        let (store, _medium, clock) = create_test_store();
        store.persist("users", &vec!["alice"]).unwrap();

        clock.advance(Duration::days(3650));

        assert_eq!(store.get::<Vec<String>>("users"), Some(vec!["alice".to_string()]));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss_but_not_evicted() {
        let (store, medium, _clock) = create_test_store();
        medium.set_item("broken", "{not json").unwrap();
        medium
            .set_item(
                "bad_ttl",
                r#"{"value":1,"written_at":"2024-01-01T00:00:00Z","ttl_ms":-9223372036854775808}"#,
            )
            .unwrap();

        assert_eq!(store.get::<TestData>("broken"), None);
        assert!(medium.get_item("broken").unwrap().is_some());

        assert_eq!(store.get::<i32>("bad_ttl"), None);
        assert!(!store.has("bad_ttl"));
        assert!(medium.get_item("bad_ttl").unwrap().is_some());
    }

    #[test]
    fn test_wrong_shape_is_a_miss() {
        let (store, _medium, _clock) = create_test_store();
        store.set_default("k", &"a string").unwrap();

        assert_eq!(store.get::<TestData>("k"), None);
    }

    #[test]
    fn test_remove_clear_keys_and_size() {
        let (store, _medium, _clock) = create_test_store();
        store.set_default("a", &1).unwrap();
        store.set_default("b", &2).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.size().unwrap(), 2);

        store.remove("a").unwrap();
        assert!(!store.has("a"));
        assert_eq!(store.size().unwrap(), 1);

        store.clear().unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_sweep_uses_age_not_ttl() {
        let (store, _medium, clock) = create_test_store();
        store.set("resource_cache_old", &1, Duration::days(1)).unwrap();
        store.set("other_old", &1, Duration::days(1)).unwrap();

        clock.advance(Duration::minutes(61));
        store.set("resource_cache_new", &2, Duration::days(1)).unwrap();

        let removed = store.sweep("resource_cache_", Duration::minutes(60)).unwrap();

        assert_eq!(removed, 1);
        assert!(!store.has("resource_cache_old"));
        assert!(store.has("resource_cache_new"));
        assert!(store.has("other_old"), "keys outside the prefix are untouched");
    }

    #[test]
    fn test_sweep_skips_corrupt_entries() {
        let (store, medium, clock) = create_test_store();
        medium.set_item("resource_cache_bad", "garbage").unwrap();
        clock.advance(Duration::hours(2));

        assert_eq!(store.sweep("resource_cache_", Duration::minutes(60)).unwrap(), 0);
        assert!(medium.get_item("resource_cache_bad").unwrap().is_some());
    }

    #[test]
    fn test_file_backed_store_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let medium = Arc::new(FileMedium::with_dir(temp_dir.path().join("nested")));
        let store = ExpiringStore::new(medium);
        let data = test_data("on disk", 7);

        store.set_default("disk_key", &data).unwrap();

        assert_eq!(store.get::<TestData>("disk_key"), Some(data));
        assert!(temp_dir.path().join("nested").join("disk_key.json").exists());
    }

    #[test]
    fn test_overwrite_resets_written_at() {
        let (store, _medium, clock) = create_test_store();
        store.set("k", &1, Duration::minutes(10)).unwrap();
        clock.advance(Duration::minutes(8));
        store.set("k", &2, Duration::minutes(10)).unwrap();
        clock.advance(Duration::minutes(8));

        assert_eq!(store.get::<i32>("k"), Some(2));
    }
}
