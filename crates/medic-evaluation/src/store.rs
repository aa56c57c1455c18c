//! Evaluation storage backends.

use crate::error::EvaluationError;
use async_trait::async_trait;
use medic_core::{EvaluationBackend, EvaluationConfig, FixRecord};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for fix record storage backends.
#[async_trait]
pub trait EvaluationSink: Send + Sync {
    /// Insert or replace the record with the same id.
    async fn store(&self, record: &FixRecord) -> Result<(), EvaluationError>;

    /// Get a record by id.
    async fn get(&self, id: &str) -> Result<Option<FixRecord>, EvaluationError>;

    /// Up to `limit` records, newest first.
    async fn list(&self, limit: usize) -> Result<Vec<FixRecord>, EvaluationError>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, EvaluationError>;

    /// Remove every record. Returns how many were removed.
    async fn delete_all(&self) -> Result<usize, EvaluationError>;
}

/// Create a storage backend based on configuration.
pub fn create_store(config: &EvaluationConfig) -> Result<Arc<dyn EvaluationSink>, EvaluationError> {
    match config.backend {
        EvaluationBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        EvaluationBackend::File => Ok(Arc::new(FileStore::new(&config.directory)?)),
        EvaluationBackend::None => Ok(Arc::new(NullStore)),
    }
}

fn newest_first(mut records: Vec<FixRecord>, limit: usize) -> Vec<FixRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    records.truncate(limit);
    records
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, FixRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvaluationSink for MemoryStore {
    async fn store(&self, record: &FixRecord) -> Result<(), EvaluationError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FixRecord>, EvaluationError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<FixRecord>, EvaluationError> {
        let records = self.records.read().await.values().cloned().collect();
        Ok(newest_first(records, limit))
    }

    async fn delete(&self, id: &str) -> Result<bool, EvaluationError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn delete_all(&self) -> Result<usize, EvaluationError> {
        let mut records = self.records.write().await;
        let count = records.len();
        records.clear();
        Ok(count)
    }
}

/// File storage: one pretty-printed `<id>.json` document per record.
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `directory`. The directory is created on
    /// first write.
    pub fn new(directory: impl AsRef<Path>) -> Result<Self, EvaluationError> {
        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() {
            return Err(EvaluationError::StorageError(
                "evaluation directory must not be empty".to_string(),
            ));
        }
        Ok(Self {
            directory: directory.to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, EvaluationError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(EvaluationError::InvalidId(id.to_string()));
        }
        Ok(self.directory.join(format!("{}.json", id)))
    }

    /// Paths of all record documents. A missing directory holds no records.
    async fn record_paths(&self) -> Result<Vec<PathBuf>, EvaluationError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl EvaluationSink for FileStore {
    async fn store(&self, record: &FixRecord) -> Result<(), EvaluationError> {
        let path = self.path_for(&record.id)?;
        let json = serde_json::to_vec_pretty(record)?;

        tokio::fs::create_dir_all(&self.directory).await?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &path).await?;

        tracing::debug!(fix_id = %record.id, path = %path.display(), "Stored fix record");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FixRecord>, EvaluationError> {
        let path = self.path_for(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<FixRecord>, EvaluationError> {
        let mut records = Vec::new();
        for path in self.record_paths().await? {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<FixRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable fix record");
                }
            }
        }
        Ok(newest_first(records, limit))
    }

    async fn delete(&self, id: &str) -> Result<bool, EvaluationError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self) -> Result<usize, EvaluationError> {
        let mut removed = 0;
        for path in self.record_paths().await? {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Null storage (discards everything).
pub struct NullStore;

#[async_trait]
impl EvaluationSink for NullStore {
    async fn store(&self, _record: &FixRecord) -> Result<(), EvaluationError> {
        Ok(())
    }

    async fn get(&self, _id: &str) -> Result<Option<FixRecord>, EvaluationError> {
        Ok(None)
    }

    async fn list(&self, _limit: usize) -> Result<Vec<FixRecord>, EvaluationError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: &str) -> Result<bool, EvaluationError> {
        Ok(false)
    }

    async fn delete_all(&self) -> Result<usize, EvaluationError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use medic_core::{Attempt, FinalStatus};

    fn record_at(minutes_ago: i64) -> FixRecord {
        let mut record = FixRecord::new();
        record.timestamp = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    async fn exercise(store: &dyn EvaluationSink) {
        let old = record_at(10);
        let mid = record_at(5);
        let new = record_at(0);
        for record in [&mid, &old, &new] {
            store.store(record).await.unwrap();
        }

        let listed = store.list(2).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), mid.id.as_str()]);

        // upsert
        let mut updated = old.clone();
        updated.push_attempt(Attempt::failed(1, "planner unavailable"));
        store.store(&updated).await.unwrap();
        assert_eq!(store.list(100).await.unwrap().len(), 3);
        let fetched = store.get(&old.id).await.unwrap().unwrap();
        assert_eq!(fetched.attempts.len(), 1);
        assert_eq!(fetched.final_status, FinalStatus::FailedAfterRetries);

        assert!(store.delete(&mid.id).await.unwrap());
        assert!(!store.delete(&mid.id).await.unwrap());
        assert!(store.get(&mid.id).await.unwrap().is_none());

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.delete_all().await.unwrap(), 0);
        assert!(store.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("evaluations")).unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_file_store_writes_one_document_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let record = FixRecord::new();
        store.store(&record).await.unwrap();

        let path = dir.path().join(format!("{}.json", record.id));
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(json["id"], record.id.as_str());
        assert_eq!(json["finalStatus"], "FAILED_AFTER_RETRIES");
    }

    #[tokio::test]
    async fn test_file_store_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created")).unwrap();
        assert!(store.list(10).await.unwrap().is_empty());
        assert!(store.get("fix_deadbeef").await.unwrap().is_none());
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("fix_garbage1.json"), b"{ not json").unwrap();
        store.store(&FixRecord::new()).await.unwrap();

        assert_eq!(store.list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.get("../etc/passwd").await,
            Err(EvaluationError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_null_store() {
        let store = NullStore;
        store.store(&FixRecord::new()).await.unwrap();
        assert!(store.list(10).await.unwrap().is_empty());
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }

    #[test]
    fn test_create_store_from_config() {
        let config = EvaluationConfig {
            backend: EvaluationBackend::Memory,
            ..Default::default()
        };
        assert!(create_store(&config).is_ok());

        let config = EvaluationConfig {
            backend: EvaluationBackend::File,
            directory: PathBuf::new(),
        };
        assert!(create_store(&config).is_err());
    }
}
