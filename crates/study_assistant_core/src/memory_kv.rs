//! crates/study_assistant_core/src/memory_kv.rs
//!
//! An in-memory `KeyValueStore`, used as the default backend in development and
//! as the test double for everything built on the key-value port.

use crate::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A `HashMap`-backed store with an optional byte quota.
///
/// The quota counts the bytes of every key and value, the way browser local
/// storage accounts for its limit.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used by all keys and values.
    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.lock();
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(PortError::StorageFull(format!(
                    "writing '{}' needs {} bytes but the quota is {} bytes",
                    key, needed, quota
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_and_remove() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn quota_rejects_oversized_write_and_keeps_old_value() {
        let store = InMemoryKeyValueStore::with_quota(10);
        store.set("k", "1234").await.unwrap();

        let err = store.set("k", "0123456789").await.unwrap_err();
        assert!(matches!(err, PortError::StorageFull(_)));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("1234"));
        assert_eq!(store.used_bytes(), 5);
    }

    #[tokio::test]
    async fn replacing_a_value_only_counts_it_once() {
        let store = InMemoryKeyValueStore::with_quota(6);
        store.set("k", "12345").await.unwrap();
        store.set("k", "54321").await.unwrap();
        assert_eq!(store.used_bytes(), 6);
    }
}
