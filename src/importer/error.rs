// ==========================================
// EEU Ingest - importer error types
// ==========================================
// Terminal errors of one import; warnings travel with
// the successful result instead.
// ==========================================

use crate::config::ConfigError;
use crate::parser::ParseError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Parsing =====
    #[error(transparent)]
    Parse(#[from] ParseError),

    // ===== Configuration =====
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    // ===== Request =====
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown report type code: {0}")]
    UnknownReportType(u8),

    // ===== Collaborators =====
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    // ===== Generic =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;
