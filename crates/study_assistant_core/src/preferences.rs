//! crates/study_assistant_core/src/preferences.rs
//!
//! Per-user preferences, stored one JSON document per user in a `KeyValueStore`.

use crate::domain::UserPreferences;
use crate::ports::{KeyValueStore, PortResult};
use std::sync::Arc;
use tracing::warn;

pub struct PreferencesStore {
    kv: Arc<dyn KeyValueStore>,
}

impl PreferencesStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Returns the user's preferences, or the defaults when none can be read.
    pub async fn get(&self, user_id: &str) -> UserPreferences {
        let key = preferences_key(user_id);
        let raw = match self.kv.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserPreferences::default(),
            Err(e) => {
                warn!(user_id, error = %e, "Could not read user preferences, using defaults");
                return UserPreferences::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(user_id, error = %e, "Stored user preferences are unreadable, using defaults");
            UserPreferences::default()
        })
    }

    pub async fn update(&self, user_id: &str, prefs: UserPreferences) -> PortResult<()> {
        let serialized = serde_json::to_string(&prefs)?;
        self.kv.set(&preferences_key(user_id), &serialized).await
    }
}

fn preferences_key(user_id: &str) -> String {
    format!("userPreferences:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_kv::InMemoryKeyValueStore;

    #[tokio::test]
    async fn unknown_user_gets_the_guide() {
        let store = PreferencesStore::new(Arc::new(InMemoryKeyValueStore::new()));
        assert!(store.get("new-user").await.show_user_guide);
    }

    #[tokio::test]
    async fn update_is_per_user() {
        let store = PreferencesStore::new(Arc::new(InMemoryKeyValueStore::new()));
        store
            .update("alice", UserPreferences { show_user_guide: false })
            .await
            .unwrap();

        assert!(!store.get("alice").await.show_user_guide);
        assert!(store.get("bob").await.show_user_guide);
    }

    #[tokio::test]
    async fn corrupt_preferences_fall_back_to_defaults() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        kv.set("userPreferences:carol", "nope").await.unwrap();
        let store = PreferencesStore::new(kv);
        assert_eq!(store.get("carol").await, UserPreferences::default());
    }
}
