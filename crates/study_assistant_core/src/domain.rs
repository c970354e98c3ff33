//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! The serde shapes here are the persisted shapes: study sessions are stored as
//! one camelCase JSON array, so field names must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Call Monitoring
//=========================================================================================

/// The fixed set of monitored operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationName {
    ExtractText,
    Summarize,
    GenerateQuiz,
    Chat,
}

impl OperationName {
    pub const ALL: [OperationName; 4] = [
        OperationName::ExtractText,
        OperationName::Summarize,
        OperationName::GenerateQuiz,
        OperationName::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationName::ExtractText => "extract-text",
            OperationName::Summarize => "summarize",
            OperationName::GenerateQuiz => "generate-quiz",
            OperationName::Chat => "chat",
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Error,
}

/// One record of a monitored call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub operation: OperationName,
    /// Wall-clock milliseconds since the Unix epoch.
    pub start_time: i64,
    pub end_time: i64,
    pub duration_ms: i64,
    pub status: CallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.status == CallStatus::Error
    }
}

//=========================================================================================
// Study Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// A multiple-choice question produced by the quiz generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
}

impl QuizQuestion {
    /// True when the correct answer is one of the options.
    ///
    /// Stores never call this; it exists for producers that want to check
    /// generator output before handing it on.
    pub fn is_well_formed(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

/// A named, timestamped snapshot of the user's study material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

/// The caller-supplied part of a study session, before an id and timestamp are assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudySession {
    pub name: String,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

//=========================================================================================
// User Preferences
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub show_user_guide: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            show_user_guide: true,
        }
    }
}
