//! services/api/src/adapters/file_kv.rs
//!
//! A file-backed implementation of the `KeyValueStore` port. Each key is one
//! file in the data directory; writes go to a temp file that is then renamed
//! over the old one, so a crash mid-write never leaves a half-written value.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use study_assistant_core::ports::{KeyValueStore, PortError, PortResult};
use tokio::fs;
use uuid::Uuid;

const VALUE_EXTENSION: &str = "kv";
const TEMP_EXTENSION: &str = "tmp";

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileKeyValueStore {
    /// Creates the store, creating `data_dir` if it does not exist yet.
    pub async fn new(data_dir: impl Into<PathBuf>, quota_bytes: Option<usize>) -> PortResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await.map_err(|e| {
            PortError::Unexpected(format!(
                "could not create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            data_dir,
            quota_bytes,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // Keys are encoded so that any string maps to one safe file name.
    fn value_path(&self, key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", URL_SAFE_NO_PAD.encode(key), VALUE_EXTENSION))
    }

    // Unique per write, so concurrent writers of one key never share a temp file.
    fn temp_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(key),
            Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ))
    }

    /// Bytes used by every key and value except `skip_key`.
    async fn used_bytes_excluding(&self, skip_key: &str) -> PortResult<usize> {
        let mut used = 0;
        let mut entries = fs::read_dir(&self.data_dir).await.map_err(unexpected)?;
        while let Some(entry) = entries.next_entry().await.map_err(unexpected)? {
            let path = entry.path();
            if path.extension().map_or(true, |e| e != VALUE_EXTENSION) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| URL_SAFE_NO_PAD.decode(s).ok())
            else {
                continue;
            };
            if key == skip_key.as_bytes() {
                continue;
            }
            let size = entry.metadata().await.map_err(unexpected)?.len() as usize;
            used += key.len() + size;
        }
        Ok(used)
    }
}

fn unexpected(e: std::io::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn write_error(e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::StorageFull => PortError::StorageFull(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        match fs::read_to_string(self.value_path(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unexpected(e)),
        }
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

        let path = self.value_path(key);
        let temp = self.temp_path(key);
        if let Err(e) = fs::write(&temp, value).await {
            let _ = fs::remove_file(&temp).await;
            return Err(write_error(e));
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(write_error(e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unexpected(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use study_assistant_core::domain::NewStudySession;
    use study_assistant_core::session_store::SessionStore;
    use tempfile::TempDir;

    async fn create_test_store(quota: Option<usize>) -> (FileKeyValueStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().join("data"), quota)
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn creates_data_directory() {
        let (store, _temp) = create_test_store(None).await;
        assert!(store.data_dir().is_dir());
    }

    #[tokio::test]
    async fn get_missing_key() {
        let (store, _temp) = create_test_store(None).await;
        assert_eq!(store.get("studySessions").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_get_remove() {
        let (store, _temp) = create_test_store(None).await;
        store.set("userPreferences:a/b", "{}").await.unwrap();
        assert_eq!(
            store.get("userPreferences:a/b").await.unwrap().as_deref(),
            Some("{}")
        );

        store.remove("userPreferences:a/b").await.unwrap();
        store.remove("userPreferences:a/b").await.unwrap();
        assert_eq!(store.get("userPreferences:a/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let (store, _temp) = create_test_store(None).await;
        store.set("k", "value").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(store.data_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].extension().unwrap(), VALUE_EXTENSION);
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_key_all_succeed() {
        let (store, _temp) = create_test_store(None).await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set("userPreferences:u1", &format!("value-{}", i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let value = store.get("userPreferences:u1").await.unwrap().unwrap();
        assert!(value.starts_with("value-"));
        let names: Vec<_> = std::fs::read_dir(store.data_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].extension().unwrap(), VALUE_EXTENSION);
    }

    #[tokio::test]
    async fn stray_temp_files_are_not_counted_as_values() {
        let (store, _temp) = create_test_store(Some(10)).await;
        std::fs::write(store.temp_path("k"), "x".repeat(100)).unwrap();
        store.set("k", "123456789").await.unwrap();
    }

    #[tokio::test]
    async fn quota_counts_other_keys_and_keeps_old_value() {
        let (store, _temp) = create_test_store(Some(19)).await;
        store.set("a", "123456789").await.unwrap();
        store.set("b", "12345678").await.unwrap();

        let err = store.set("b", "123456789").await.unwrap_err();
        assert!(matches!(err, PortError::StorageFull(_)));
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("12345678"));
    }

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let (store, _temp) = create_test_store(None).await;
        let sessions = SessionStore::new(Arc::new(store.clone()));
        let id = sessions
            .save(NewStudySession {
                name: "Biology".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let reopened = FileKeyValueStore::new(store.data_dir().to_path_buf(), None)
            .await
            .unwrap();
        let sessions = SessionStore::new(Arc::new(reopened));
        assert_eq!(sessions.load(&id).await.unwrap().unwrap().name, "Biology");
    }
}
