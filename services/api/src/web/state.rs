//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_assistant_core::{
    monitor::CallMonitor,
    ports::{KeyValueStore, StudyAiService},
    preferences::PreferencesStore,
    session_store::SessionDirectory,
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Already wrapped by the call monitor.
    pub study_ai: Arc<dyn StudyAiService>,
    /// Saved sessions, one collection per user.
    pub sessions: Arc<SessionDirectory>,
    pub preferences: Arc<PreferencesStore>,
    pub monitor: CallMonitor,
}

impl AppState {
    /// Builds the state from a key-value backend. Sessions and preferences share it.
    pub fn new(
        config: Arc<Config>,
        study_ai: Arc<dyn StudyAiService>,
        kv: Arc<dyn KeyValueStore>,
        monitor: CallMonitor,
    ) -> Self {
        Self {
            config,
            study_ai,
            sessions: Arc::new(SessionDirectory::new(kv.clone())),
            preferences: Arc::new(PreferencesStore::new(kv)),
            monitor,
        }
    }
}
