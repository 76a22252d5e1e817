// ==========================================
// EEU Ingest - importer layer
// ==========================================
// Fetch, dispatch, crosswalk, units, assembly and the
// pipeline that ties them to the storage collaborator.
// ==========================================

pub mod aggregator;
pub mod dispatcher;
pub mod document_fetcher;
pub mod error;
pub mod field_mapper;
pub mod project_validator;
pub mod report_importer_impl;
pub mod report_importer_trait;
pub mod unit_normalizer;
pub mod weather;

pub use aggregator::{assemble, total_energy, Assembled};
pub use dispatcher::Dispatcher;
pub use document_fetcher::{
    file_name_from_url, DefaultDocumentFetcher, DocumentFetcher, FileDocumentFetcher, HttpDocumentFetcher,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, MappedObservation, MappingOutcome};
pub use project_validator::{validate_projects, EnumLookup, StaticEnumLookup, ALLOWED_PROJECT_ENERGY_UNITS};
pub use report_importer_impl::{normalize_report, NormalizedUpload, ReportImporterImpl};
pub use report_importer_trait::{ImportOutcome, ReportImporter, UploadRequest};
pub use unit_normalizer::{display_view, to_mbtu, DisplayUnits, DisplayView};
pub use weather::{NoopWeatherLookup, WeatherLookup};
