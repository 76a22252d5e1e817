// ==========================================
// EEU Ingest - repository layer
// ==========================================
// Storage behind a narrow insert/query interface.
// All SQL is parameterized.
// ==========================================

pub mod eeu_record_repo;
pub mod eeu_record_repo_impl;
pub mod error;

pub use eeu_record_repo::{EeuRecordRepository, InMemoryEeuRecordRepository};
pub use eeu_record_repo_impl::SqliteEeuRecordRepository;
pub use error::{RepositoryError, RepositoryResult};
