pub mod domain;
pub mod memory_kv;
pub mod monitor;
pub mod ports;
pub mod preferences;
pub mod session_store;

pub use domain::{
    CallStatus, ChatMessage, ChatRole, LogEntry, NewStudySession, OperationName, QuizQuestion,
    StudySession, UserPreferences,
};
pub use memory_kv::InMemoryKeyValueStore;
pub use monitor::{format_duration, CallMonitor, LogSummary, OperationStats};
pub use ports::{KeyValueStore, PortError, PortResult, StudyAiService};
pub use preferences::PreferencesStore;
pub use session_store::{SessionDirectory, SessionStore, DEFAULT_SESSIONS_KEY};
