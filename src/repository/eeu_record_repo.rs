// ==========================================
// EEU Ingest - EEU record repository trait
// ==========================================
// Storage collaborator for normalized uploads.
// No business rules here, only insert and query.
// ==========================================

use crate::domain::UploadRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// EeuRecordRepository Trait
// ==========================================
// Implementations: SqliteEeuRecordRepository, InMemoryEeuRecordRepository
#[async_trait]
pub trait EeuRecordRepository: Send + Sync {
    /// Stores one upload.
    ///
    /// # Returns
    /// - Ok(String): id of the stored record
    /// - Err: database error, or a record with this id already exists
    async fn insert(&self, record: &UploadRecord) -> RepositoryResult<String>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<UploadRecord>>;

    /// Every upload of one document URL, oldest first.
    async fn list_by_file_url(&self, file_url: &str) -> RepositoryResult<Vec<UploadRecord>>;
}

// ==========================================
// InMemoryEeuRecordRepository
// ==========================================
/// Keeps records in insertion order; used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEeuRecordRepository {
    records: Arc<Mutex<Vec<UploadRecord>>>,
}

impl InMemoryEeuRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Vec<UploadRecord>>> {
        self.records
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl EeuRecordRepository for InMemoryEeuRecordRepository {
    async fn insert(&self, record: &UploadRecord) -> RepositoryResult<String> {
        let mut records = self.lock()?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(RepositoryError::UniqueConstraintViolation(format!("eeu_record.id = {}", record.id)));
        }
        records.push(record.clone());
        debug!(id = %record.id, "record kept in memory");
        Ok(record.id.clone())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<UploadRecord>> {
        Ok(self.lock()?.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_file_url(&self, file_url: &str) -> RepositoryResult<Vec<UploadRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.file_url == file_url)
            .cloned()
            .collect())
    }
}
