// ==========================================
// EEU Ingest - eQuest SIM output (plain text)
// ==========================================
// Same BEPS table as the PDF report, inside the
// form-feed separated SIM dump. Uses the BEPS crosswalk.
// ==========================================

use crate::domain::{ParsedReport, ReportType};
use crate::parser::document::LoadedDocument;
use crate::parser::equest_beps::{parse_beps_pages, BEPS_TITLE};
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};

pub struct EquestSimParser;

impl ReportParser for EquestSimParser {
    fn report_type(&self) -> ReportType {
        ReportType::EquestSim
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let text = doc.text()?;
        if !text.contains(BEPS_TITLE) {
            return Err(ParseError::layout("SIM: BEPS report not found"));
        }
        let pages = doc.text_pages()?;
        parse_beps_pages(&pages, ReportType::EquestSim, ctx).map(ParsedReport::Energy)
    }
}
