// ==========================================
// EEU Ingest - configuration layer
// ==========================================
// Crosswalk tables (read-only, shared) and runtime settings
// ==========================================

pub mod config_manager;
pub mod crosswalk;
pub mod error;

pub use config_manager::{config_keys, default_db_path, IngestConfig, SumCheckTolerance};
pub use crosswalk::{normalize_label, CanonicalField, CrosswalkConfig, NormalizedLabel};
pub use error::{ConfigError, ConfigResult};
