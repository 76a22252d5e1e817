// ==========================================
// EEU Ingest - core library
// ==========================================
// Parses building energy simulation reports (EnergyPlus,
// eQuest, IES-VE, spreadsheets) into one canonical
// per-end-use record in MBtu.
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain layer - shared types and records
pub mod domain;

// Configuration - crosswalk tables and runtime settings
pub mod config;

// Parser layer - one ReportParser per report type
pub mod parser;

// Importer layer - fetch, dispatch, crosswalk, units, assembly
pub mod importer;

// Repository layer - record storage
pub mod repository;

// SQLite connection setup (uniform PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

pub use config::{CrosswalkConfig, IngestConfig};
pub use domain::{
    BaselineDesign, EnergyUnit, FuelCategory, NormalizedRecord, ParseWarning, ProjectBatch, ReportType,
    UploadRecord, WarningCode,
};
pub use importer::{ImportError, ImportOutcome, ReportImporter, ReportImporterImpl, UploadRequest};
pub use parser::{LoadedDocument, ParseError, ReportParser};
pub use repository::{EeuRecordRepository, InMemoryEeuRecordRepository, SqliteEeuRecordRepository};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "eeu-ingest";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
