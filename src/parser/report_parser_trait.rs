// ==========================================
// EEU Ingest - ReportParser trait
// ==========================================
// One implementation per report type. Parsing is
// synchronous and works on an in-memory document.
// ==========================================

use crate::config::{CrosswalkConfig, SumCheckTolerance};
use crate::domain::{BaselineDesign, ParsedReport, ReportType};
use crate::parser::document::LoadedDocument;
use crate::parser::error::ParseResult;

/// Request-scoped inputs a parser may need besides the document.
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    pub crosswalk: &'a CrosswalkConfig,
    pub baseline_design: BaselineDesign,
    /// Area supplied with the upload, for formats that do not print one.
    pub conditioned_area: Option<f64>,
    pub zip_code: Option<String>,
    pub sum_check: SumCheckTolerance,
}

impl<'a> ParseContext<'a> {
    pub fn new(crosswalk: &'a CrosswalkConfig) -> Self {
        Self {
            crosswalk,
            baseline_design: BaselineDesign::default(),
            conditioned_area: None,
            zip_code: None,
            sum_check: SumCheckTolerance::default(),
        }
    }
}

// ==========================================
// ReportParser Trait
// ==========================================
pub trait ReportParser: Send + Sync {
    fn report_type(&self) -> ReportType;

    /// Extracts observations (or project rows) from the document.
    ///
    /// # Arguments
    /// - doc: fetched document with lazily decoded views
    /// - ctx: crosswalk, tolerance and upload-supplied metadata
    ///
    /// # Returns
    /// - Ok(ParsedReport): observations, metadata and non-fatal warnings
    /// - Err(ParseError): layout not recognized or document unreadable
    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport>;
}
