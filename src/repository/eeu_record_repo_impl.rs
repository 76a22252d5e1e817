// ==========================================
// EEU Ingest - SQLite EEU record repository
// ==========================================
// Table eeu_record: indexed bookkeeping columns, the
// flattened output row and the full upload as JSON.
// ==========================================

use crate::db::{open_in_memory_connection, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::UploadRecord;
use crate::repository::eeu_record_repo::EeuRecordRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS eeu_record (
    id TEXT NOT NULL PRIMARY KEY,
    file_url TEXT NOT NULL,
    file_name TEXT NOT NULL,
    report_type INTEGER NOT NULL,
    baseline_design TEXT NOT NULL,
    total_energy REAL NOT NULL,
    created_at TEXT NOT NULL,
    row_json TEXT NOT NULL,
    record_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_eeu_record_file_url ON eeu_record (file_url);
"#;

pub struct SqliteEeuRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEeuRecordRepository {
    /// Opens (or creates) the database file and its schema.
    ///
    /// # Arguments
    /// - db_path: SQLite file path; missing parent directories are created
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        info!(db_path, "record store opened");
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// Wraps an existing connection, creating the schema if needed.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(SCHEMA)?;
        match read_schema_version(&conn)? {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![CURRENT_SCHEMA_VERSION],
                )?;
            }
            Some(v) if v != CURRENT_SCHEMA_VERSION => {
                warn!(found = v, expected = CURRENT_SCHEMA_VERSION, "record store schema version differs");
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn decode(record_json: &str) -> RepositoryResult<UploadRecord> {
        Ok(serde_json::from_str(record_json)?)
    }
}

#[async_trait]
impl EeuRecordRepository for SqliteEeuRecordRepository {
    async fn insert(&self, record: &UploadRecord) -> RepositoryResult<String> {
        let row_json = serde_json::to_string(&record.to_row())?;
        let record_json = serde_json::to_string(record)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO eeu_record (
                id, file_url, file_name, report_type, baseline_design,
                total_energy, created_at, row_json, record_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.file_url,
                record.file_name,
                record.record.report_type.code(),
                record.baseline_design.to_string(),
                record.record.total_energy,
                record.created_at.to_rfc3339(),
                row_json,
                record_json,
            ],
        )?;
        info!(id = %record.id, file_url = %record.file_url, "record stored");
        Ok(record.id.clone())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<UploadRecord>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM eeu_record WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        json.as_deref().map(Self::decode).transpose()
    }

    async fn list_by_file_url(&self, file_url: &str) -> RepositoryResult<Vec<UploadRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT record_json FROM eeu_record WHERE file_url = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![file_url], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for json in rows {
            records.push(Self::decode(&json?)?);
        }
        Ok(records)
    }
}
