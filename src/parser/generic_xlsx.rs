// ==========================================
// EEU Ingest - generic spreadsheet upload
// ==========================================
// Row 0: headers; row 1: the building.
// Required: conditioned_area, area_units, energy_units, zip_code
// Every other column is one energy field (canonical names).
// ==========================================

use crate::domain::{
    AreaUnit, DocumentMetadata, EnergyUnit, ParseWarning, ParsedEnergyReport, ParsedReport,
    RawObservation, ReportType, WarningCode,
};
use crate::parser::document::{CellValue, LoadedDocument, SheetGrid};
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::numeric::read_number;
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use tracing::debug;

pub const REQUIRED_COLUMNS: [&str; 4] = ["conditioned_area", "area_units", "energy_units", "zip_code"];

fn cell_text(grid: &SheetGrid, row: usize, col: usize) -> String {
    grid.cell(row, col).map(CellValue::as_text).unwrap_or_default()
}

pub struct GenericXlsxParser;

impl ReportParser for GenericXlsxParser {
    fn report_type(&self) -> ReportType {
        ReportType::GenericXlsx
    }

    fn parse(&self, doc: &LoadedDocument, _ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let grid = doc.sheet()?;
        let headers: Vec<String> = grid.row_texts(0).iter().map(|h| h.trim().to_string()).collect();

        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let mut required = [0usize; 4];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = column(name)
                .ok_or_else(|| ParseError::layout(format!("spreadsheet: required column '{}' missing", name)))?;
        }
        let [area_col, area_units_col, energy_units_col, zip_col] = required;

        let data_row = (1..grid.rows.len())
            .find(|r| !grid.is_blank_row(*r))
            .ok_or_else(|| ParseError::layout("spreadsheet: no data row"))?;

        let energy_label = cell_text(grid, data_row, energy_units_col);
        let energy_unit =
            EnergyUnit::from_label(&energy_label).ok_or_else(|| ParseError::UnsupportedUnit(energy_label.clone()))?;
        let area_label = cell_text(grid, data_row, area_units_col);
        let area_unit = AreaUnit::from_label(&area_label)
            .ok_or_else(|| ParseError::layout(format!("spreadsheet: unknown area unit '{}'", area_label)))?;

        let mut warnings: Vec<ParseWarning> = Vec::new();
        let mut meta = DocumentMetadata::new(ReportType::GenericXlsx, energy_unit);
        meta.weather_string = cell_text(grid, data_row, zip_col);

        let area_raw = cell_text(grid, data_row, area_col);
        match read_number(&area_raw, "spreadsheet conditioned_area", &mut warnings) {
            Some(area) if area > 0.0 => meta.set_conditioned_area(area, area_unit),
            _ => warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "spreadsheet: conditioned_area is empty or not positive",
            )),
        }

        let mut observations = Vec::new();
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() || required.contains(&col) {
                continue;
            }
            let raw = cell_text(grid, data_row, col);
            if let Some(value) = read_number(&raw, &format!("spreadsheet {}", header), &mut warnings) {
                observations.push(RawObservation::new(header.clone(), value, ReportType::GenericXlsx));
            }
        }

        if observations.is_empty() {
            return Err(ParseError::layout("spreadsheet: no energy columns with values"));
        }

        debug!(observations = observations.len(), unit = %energy_unit, "generic spreadsheet parsed");
        Ok(ParsedReport::Energy(ParsedEnergyReport {
            observations,
            metadata: meta,
            warnings,
        }))
    }
}
