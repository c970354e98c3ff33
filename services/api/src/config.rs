//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Browser local storage gives an origin roughly this much room.
const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where study sessions and preferences are persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File { data_dir: PathBuf },
    Postgres { database_url: String },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub study_model: String,
    pub storage: StorageBackend,
    /// `None` means unlimited.
    pub storage_quota_bytes: Option<usize>,
    pub admin_token: Option<String>,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- AI Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let study_model = lookup("STUDY_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Storage Settings ---
        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "file".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File {
                data_dir: lookup("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data")),
            },
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of memory, file, postgres", other),
                ))
            }
        };

        let storage_quota_bytes = match lookup("STORAGE_QUOTA_BYTES") {
            None => Some(DEFAULT_STORAGE_QUOTA_BYTES),
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => None,
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    return Err(ConfigError::InvalidValue(
                        "STORAGE_QUOTA_BYTES".to_string(),
                        e.to_string(),
                    ))
                }
            },
        };

        // --- Admin Dashboard ---
        let admin_token = lookup("ADMIN_TOKEN").filter(|t| !t.trim().is_empty());

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            study_model,
            storage,
            storage_quota_bytes,
            admin_token,
            cors_origin,
        })
    }
}
