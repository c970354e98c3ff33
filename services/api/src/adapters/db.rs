//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of the
//! `KeyValueStore` port from the `core` crate. It is the remote profile store:
//! every key lives in one row of the `kv_entries` table.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use study_assistant_core::ports::{KeyValueStore, PortError, PortResult};

/// Postgres SQLSTATE for `disk_full`.
const PG_DISK_FULL: &str = "53100";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `KeyValueStore` port.
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
    quota_bytes: Option<usize>,
}

impl PgKeyValueStore {
    /// Creates a new `PgKeyValueStore`.
    pub fn new(pool: PgPool, quota_bytes: Option<usize>) -> Self {
        Self { pool, quota_bytes }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn used_bytes_excluding(&self, key: &str) -> PortResult<usize> {
        let used: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(octet_length(key) + octet_length(value)), 0)::BIGINT FROM kv_entries WHERE key <> $1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(used.max(0) as usize)
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct KvRecord {
    value: String,
}

fn to_port_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(PG_DISK_FULL) => {
            PortError::StorageFull(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let record = sqlx::query_as::<_, KvRecord>(
            "SELECT value FROM kv_entries WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(record.map(|r| r.value))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_excluding(key).await? + key.len() + value.len();
            if needed > quota {
                return Err(PortError::StorageFull(format!(
                    "writing '{}' needs {} bytes but the quota is {} bytes",
                    key, needed, quota
                )));
            }
        }

        sqlx::query(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;
        Ok(())
    }
}
