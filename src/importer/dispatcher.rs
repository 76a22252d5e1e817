// ==========================================
// EEU Ingest - parser dispatcher
// ==========================================
// Declared type: that parser only.
// Otherwise: fixed priority order, first success wins;
// failed attempts become warnings on the result.
// ==========================================

use crate::domain::{ParseWarning, ParsedReport, ReportType, WarningCode};
use crate::parser::{parser_for, LoadedDocument, ParseContext, ParseError, ParseResult, ReportParser, PRIORITY_ORDER};
use tracing::{debug, info, warn};

pub struct Dispatcher {
    parsers: Vec<Box<dyn ReportParser>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_parsers(PRIORITY_ORDER.iter().map(|t| parser_for(*t)).collect())
    }

    /// Dispatcher over an explicit parser list, tried in the given order.
    pub fn with_parsers(parsers: Vec<Box<dyn ReportParser>>) -> Self {
        Self { parsers }
    }

    /// Parses a document.
    ///
    /// # Arguments
    /// - doc: fetched document
    /// - declared: report type supplied with the upload, if any
    /// - ctx: request-scoped parse context
    ///
    /// # Returns
    /// - Ok(ParsedReport): first successful parse
    /// - Err(ParseError::UnsupportedFileType): no parser accepted the document
    pub fn dispatch(
        &self,
        doc: &LoadedDocument,
        declared: Option<ReportType>,
        ctx: &ParseContext<'_>,
    ) -> ParseResult<ParsedReport> {
        if let Some(report_type) = declared {
            info!(report_type = %report_type, file = doc.file_name(), "parsing with declared report type");
            return match self.parsers.iter().find(|p| p.report_type() == report_type) {
                Some(parser) => parser.parse(doc, ctx),
                None => parser_for(report_type).parse(doc, ctx),
            };
        }

        let mut attempts = Vec::new();
        let mut failures = Vec::new();
        for parser in &self.parsers {
            let report_type = parser.report_type();
            debug!(report_type = %report_type, file = doc.file_name(), "trying parser");
            match parser.parse(doc, ctx) {
                Ok(mut parsed) => {
                    info!(
                        report_type = %report_type,
                        failed_attempts = failures.len(),
                        "report type detected"
                    );
                    parsed.warnings_mut().splice(0..0, failures);
                    return Ok(parsed);
                }
                Err(err) => {
                    warn!(report_type = %report_type, error = %err, "parser attempt failed");
                    attempts.push(format!("{}: {}", report_type, err));
                    failures.push(ParseWarning::new(
                        WarningCode::ParserAttemptFailed,
                        format!("{} parser: {}", report_type, err),
                    ));
                }
            }
        }

        Err(ParseError::UnsupportedFileType { attempts })
    }
}
