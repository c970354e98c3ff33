//! crates/study_assistant_core/src/session_store.rs
//!
//! Persists saved study sessions as one JSON array under a single key of a
//! `KeyValueStore`. `SessionDirectory` gives every user their own key.
//!
//! Entries are kept as raw JSON. Only `id` and `createdAt` are interpreted when
//! saving or deleting, so entries written by an older schema survive every
//! rewrite untouched.
//!
//! Every save or delete reads the whole collection, changes it, and writes it
//! back. That read-modify-write runs under one async mutex, so writers in this
//! process never interleave. Writers in other processes sharing the same
//! backend are not guarded against.

use crate::domain::{NewStudySession, StudySession};
use crate::ports::{KeyValueStore, PortError, PortResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// The key the session collection lives under unless configured otherwise.
pub const DEFAULT_SESSIONS_KEY: &str = "studySessions";

pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

/// What a read of the stored collection found.
enum Stored {
    Entries(Vec<Value>),
    /// The stored text exists but is not a JSON array.
    Corrupt(String),
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, DEFAULT_SESSIONS_KEY)
    }

    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns every readable saved session, newest first.
    ///
    /// A collection that is not JSON reads as empty. Entries that do not fit
    /// the current session shape are skipped here but stay in storage.
    /// Failures of the backend itself are returned.
    pub async fn list(&self) -> PortResult<Vec<StudySession>> {
        let entries = match self.read().await? {
            Stored::Entries(entries) => entries,
            Stored::Corrupt(_) => Vec::new(),
        };

        let mut sessions: Vec<StudySession> = entries
            .into_iter()
            .filter_map(|entry| {
                let id = entry_id(&entry).map(str::to_owned);
                match serde_json::from_value(entry) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!(key = %self.key, session_id = ?id, error = %e, "Skipping unreadable study session");
                        None
                    }
                }
            })
            .collect();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    /// Returns the session with `id`, if there is one.
    pub async fn load(&self, id: &str) -> PortResult<Option<StudySession>> {
        Ok(self.list().await?.into_iter().find(|s| s.id == id))
    }

    /// Saves a new session stamped with the current time and returns its id.
    pub async fn save(&self, draft: NewStudySession) -> PortResult<String> {
        self.save_at(draft, Utc::now()).await
    }

    /// Saves a new session with an explicit creation time and returns its id.
    ///
    /// Fails with `PortError::Serialization` when the stored collection is
    /// unreadable, leaving it as it was.
    pub async fn save_at(
        &self,
        draft: NewStudySession,
        created_at: DateTime<Utc>,
    ) -> PortResult<String> {
        let session = StudySession {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            created_at,
            source_text: draft.source_text,
            summary: draft.summary,
            quiz: draft.quiz,
            chat_history: draft.chat_history,
        };
        let id = session.id.clone();
        let entry = serde_json::to_value(&session)?;

        self.modify(|entries| {
            entries.insert(0, entry);
            true
        })
        .await?;

        debug!(session_id = %id, "Saved study session");
        Ok(id)
    }

    /// Removes the session with `id`. Unknown ids leave the store untouched.
    pub async fn delete(&self, id: &str) -> PortResult<()> {
        let removed = self
            .modify(|entries| {
                let before = entries.len();
                entries.retain(|entry| entry_id(entry) != Some(id));
                entries.len() != before
            })
            .await?;

        if removed {
            debug!(session_id = %id, "Deleted study session");
        }
        Ok(())
    }

    /// Applies `change` to a fresh read of the collection and writes the result
    /// back when `change` reports that it changed something.
    ///
    /// An unreadable collection looks empty to `change`; if `change` still
    /// wants to write, the call fails instead of overwriting it. Returns
    /// whether a write happened.
    async fn modify<F>(&self, change: F) -> PortResult<bool>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.read().await? {
            Stored::Entries(entries) => entries,
            Stored::Corrupt(reason) => {
                if !change(&mut Vec::new()) {
                    return Ok(false);
                }
                return Err(PortError::Serialization(format!(
                    "stored study sessions under '{}' are unreadable and were left in place: {}",
                    self.key, reason
                )));
            }
        };
        if !change(&mut entries) {
            return Ok(false);
        }

        let serialized = serde_json::to_string(&entries)?;
        self.kv.set(&self.key, &serialized).await?;
        Ok(true)
    }

    async fn read(&self) -> PortResult<Stored> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Stored::Entries(Vec::new()));
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => Ok(Stored::Entries(entries)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored study sessions are unreadable, treating as empty");
                Ok(Stored::Corrupt(e.to_string()))
            }
        }
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id")?.as_str()
}

fn sort_newest_first(sessions: &mut [StudySession]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

//=========================================================================================
// Per-User Collections
//=========================================================================================

/// Hands out one `SessionStore` per user, each under `studySessions:{user_id}`.
///
/// The same user always gets the same store, so their writes share one lock.
pub struct SessionDirectory {
    kv: Arc<dyn KeyValueStore>,
    stores: std::sync::Mutex<HashMap<String, Arc<SessionStore>>>,
}

impl SessionDirectory {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            stores: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn for_user(&self, user_id: &str) -> Arc<SessionStore> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        stores
            .entry(user_id.to_string())
            .or_insert_with(|| {
                Arc::new(SessionStore::with_key(
                    self.kv.clone(),
                    user_sessions_key(user_id),
                ))
            })
            .clone()
    }
}

fn user_sessions_key(user_id: &str) -> String {
    format!("{}:{}", DEFAULT_SESSIONS_KEY, user_id)
}
