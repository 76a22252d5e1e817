// ==========================================
// EEU Ingest - parser layer
// ==========================================
// Document loading, layout descriptors, whitespace table
// detection and one ReportParser per report type.
// ==========================================

pub mod document;
pub mod eplus;
pub mod equest_beps;
pub mod equest_sim;
pub mod equest_standard;
pub mod error;
pub mod generic_xlsx;
pub mod iesve;
pub mod iesve_prm;
pub mod layout;
pub mod multi_project_xlsx;
pub mod numeric;
pub mod report_parser_trait;
pub mod text_table;

pub use document::{CellValue, DocumentKind, LoadedDocument, SheetGrid};
pub use eplus::EnergyPlusParser;
pub use equest_beps::EquestBepsParser;
pub use equest_sim::EquestSimParser;
pub use equest_standard::EquestStandardParser;
pub use error::{ParseError, ParseResult};
pub use generic_xlsx::GenericXlsxParser;
pub use iesve::IesveParser;
pub use iesve_prm::IesvePrmParser;
pub use multi_project_xlsx::MultiProjectXlsxParser;
pub use report_parser_trait::{ParseContext, ReportParser};

use crate::domain::ReportType;

/// Auto-detection order when no report type is declared.
pub const PRIORITY_ORDER: [ReportType; 8] = [
    ReportType::MultiProjectXlsx,
    ReportType::EquestBeps,
    ReportType::Iesve,
    ReportType::EnergyPlus,
    ReportType::EquestSim,
    ReportType::GenericXlsx,
    ReportType::EquestStandard,
    ReportType::IesvePrm,
];

pub fn parser_for(report_type: ReportType) -> Box<dyn ReportParser> {
    match report_type {
        ReportType::Iesve => Box::new(IesveParser),
        ReportType::EnergyPlus => Box::new(EnergyPlusParser),
        ReportType::EquestSim => Box::new(EquestSimParser),
        ReportType::GenericXlsx => Box::new(GenericXlsxParser),
        ReportType::EquestBeps => Box::new(EquestBepsParser),
        ReportType::EquestStandard => Box::new(EquestStandardParser),
        ReportType::IesvePrm => Box::new(IesvePrmParser),
        ReportType::MultiProjectXlsx => Box::new(MultiProjectXlsxParser),
    }
}

/// Every parser in auto-detection order.
pub fn all_parsers() -> Vec<Box<dyn ReportParser>> {
    PRIORITY_ORDER.iter().map(|t| parser_for(*t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_matches_type() {
        for report_type in ReportType::ALL {
            assert_eq!(parser_for(report_type).report_type(), report_type);
        }
    }

    #[test]
    fn test_priority_covers_every_type_once() {
        let mut codes: Vec<u8> = PRIORITY_ORDER.iter().map(|t| t.code()).collect();
        assert_eq!(codes[..2], [9, 5]);
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ReportType::ALL.len());
    }
}
