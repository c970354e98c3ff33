//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage backends or AI providers.

use async_trait::async_trait;
use crate::domain::{ChatMessage, QuizQuestion};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Displays as the bare message, which is what the call log records.
    #[error("{0}")]
    Unexpected(String),
    /// The backing store rejected a write because its quota is exhausted.
    #[error("Storage is full: {0}")]
    StorageFull(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for PortError {
    fn from(e: serde_json::Error) -> Self {
        PortError::Serialization(e.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string-keyed text store, the persistence primitive behind sessions and preferences.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// Backends with a quota must fail with `PortError::StorageFull` and leave
    /// the previous value in place.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The generative-AI collaborator: text extraction, summaries, quizzes and chat.
#[async_trait]
pub trait StudyAiService: Send + Sync {
    /// Extracts the readable text from an uploaded file.
    async fn extract_text(&self, file_data: &[u8], mime_type: &str) -> PortResult<String>;

    async fn generate_summary(&self, text: &str) -> PortResult<String>;

    /// Generates a multiple-choice quiz over `text`.
    async fn generate_quiz(&self, text: &str) -> PortResult<Vec<QuizQuestion>>;

    /// Answers `new_message` given the prior conversation and the study material.
    async fn chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context: &str,
    ) -> PortResult<String>;
}
