// ==========================================
// EEU Ingest - ReportImporter trait
// ==========================================
// Upload request in, normalized record (or project
// batch) out. Implementation: ReportImporterImpl
// ==========================================

use crate::domain::{BaselineDesign, ProjectBatch, ReportType, UploadRecord};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One uploaded document and the metadata supplied with it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    pub url: String,
    /// Numeric report type code; None means auto-detect.
    pub report_type: Option<u8>,
    pub baseline_design: BaselineDesign,
    pub conditioned_area: Option<f64>,
    pub zip_code: Option<String>,
}

impl UploadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Declared report type, validated against the known codes.
    pub fn declared_type(&self) -> ImportResult<Option<ReportType>> {
        match self.report_type {
            None => Ok(None),
            Some(code) => ReportType::from_code(code)
                .map(Some)
                .ok_or(ImportError::UnknownReportType(code)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Single-building report, stored through the record repository.
    Single(Box<UploadRecord>),
    /// Multi-project sheet, handed to project creation.
    MultiProject(ProjectBatch),
}

// ==========================================
// ReportImporter Trait
// ==========================================
#[async_trait]
pub trait ReportImporter: Send + Sync {
    /// Runs the whole pipeline for one upload.
    ///
    /// # Arguments
    /// - request: document URL plus upload-supplied metadata
    ///
    /// # Returns
    /// - Ok(ImportOutcome): stored record or validated project batch
    /// - Err(ImportError): terminal failure, nothing stored
    ///
    /// # Steps
    /// 1. fetch
    /// 2. dispatch (declared or auto-detected parser)
    /// 3. multi-project sheets: row validation, then return
    /// 4. crosswalk mapping, unit normalization, assembly
    /// 5. weather lookup
    /// 6. insert
    async fn import(&self, request: UploadRequest) -> ImportResult<ImportOutcome>;

    /// Imports independent uploads concurrently; one failure does not affect the others.
    async fn batch_import(&self, requests: Vec<UploadRequest>) -> Vec<ImportResult<ImportOutcome>>;
}
