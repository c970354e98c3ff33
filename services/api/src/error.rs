//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use axum::http::StatusCode;
use study_assistant_core::ports::PortError;
use tracing::{error, warn};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the database migrations at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The message shown when a save is rejected because the store is out of room.
pub const STORAGE_FULL_MESSAGE: &str =
    "Could not save session. Storage may be full; delete some old sessions and try again.";

/// Maps a port error onto the status code and short message a handler returns.
///
/// Internal details are logged here and never sent to the client; `fallback` is
/// the user-facing text for unexpected failures.
pub fn port_error_response(e: PortError, fallback: &str) -> (StatusCode, String) {
    match e {
        PortError::StorageFull(detail) => {
            warn!("Storage quota exceeded: {}", detail);
            (StatusCode::INSUFFICIENT_STORAGE, STORAGE_FULL_MESSAGE.to_string())
        }
        PortError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
        PortError::Unexpected(_) | PortError::Serialization(_) => {
            error!("{}: {:?}", fallback, e);
            (StatusCode::INTERNAL_SERVER_ERROR, fallback.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_full_is_distinguishable() {
        let (status, message) =
            port_error_response(PortError::StorageFull("quota".to_string()), "Failed");
        assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
        assert_eq!(message, STORAGE_FULL_MESSAGE);
    }

    #[test]
    fn unexpected_errors_hide_internal_text() {
        let (status, message) = port_error_response(
            PortError::Unexpected("connection reset by peer at 10.0.0.3".to_string()),
            "Could not load sessions.",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Could not load sessions.");
    }

    #[test]
    fn invalid_input_keeps_its_message() {
        let (status, message) = port_error_response(
            PortError::InvalidInput("Files of type 'x' are not supported.".to_string()),
            "Failed",
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Files of type 'x' are not supported.");
    }
}
