// ==========================================
// EEU Ingest - domain layer
// ==========================================
// Types shared by parsers, the importer pipeline and storage.
// ==========================================

pub mod observation;
pub mod project;
pub mod record;
pub mod types;

pub use observation::{
    DocumentMetadata, ParseWarning, ParsedEnergyReport, ParsedReport, RawObservation, WarningCode,
    SF_PER_SM,
};
pub use project::{EnumCategory, MultiProjectSheet, ProjectBatch, ProjectRow, ValidationError};
pub use record::{NormalizedRecord, ReportedValue, UploadRecord, WeatherInfo};
pub use types::{AreaUnit, BaselineDesign, EnergyUnit, FuelCategory, ReportType};
