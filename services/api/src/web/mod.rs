pub mod admin;
pub mod middleware;
pub mod preferences;
pub mod rest;
pub mod routes;
pub mod sessions;
pub mod state;

// Re-export the router builder to make it easily accessible
// to the binary that starts the web server.
pub use middleware::require_admin;
pub use routes::build_router;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::adapters::monitored::tests::FakeStudyAi;
    use crate::adapters::MonitoredStudyService;
    use crate::config::Config;
    use crate::web::state::AppState;
    use std::sync::Arc;
    use study_assistant_core::{memory_kv::InMemoryKeyValueStore, monitor::CallMonitor};

    fn state(fail: bool, kv: InMemoryKeyValueStore) -> Arc<AppState> {
        let config = Config::from_lookup(|name| match name {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            "ADMIN_TOKEN" => Some("test-admin".to_string()),
            _ => None,
        })
        .unwrap();
        let monitor = CallMonitor::new();
        let study_ai = MonitoredStudyService::new(Arc::new(FakeStudyAi { fail }), monitor.clone());
        Arc::new(AppState::new(
            Arc::new(config),
            Arc::new(study_ai),
            Arc::new(kv),
            monitor,
        ))
    }

    /// App state over an in-memory store and a canned AI service.
    pub(crate) fn test_state(fail: bool) -> Arc<AppState> {
        state(fail, InMemoryKeyValueStore::new())
    }

    pub(crate) fn test_state_with_quota(quota_bytes: usize) -> Arc<AppState> {
        state(false, InMemoryKeyValueStore::with_quota(quota_bytes))
    }
}
