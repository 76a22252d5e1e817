// ==========================================
// EEU Ingest - multi-project spreadsheet
// ==========================================
// Header row is one of rows 0-3 (instruction rows may
// sit above it) and must name project_name,
// conditioned_area_sf and project_use_type. Needs at
// least two named projects; otherwise the sheet is left
// to the single-building parsers.
// ==========================================

use crate::domain::{MultiProjectSheet, ParsedReport, ProjectRow, ReportType, ValidationError};
use crate::parser::document::{CellValue, LoadedDocument, SheetGrid};
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::numeric::{parse_number, CellNumber};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

const HEADER_SEARCH_ROWS: usize = 4;
const SIGNATURE_COLUMNS: [&str; 3] = ["project_name", "conditioned_area_sf", "project_use_type"];

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "project_name",
    "conditioned_area_sf",
    "zip_code",
    "project_use_type",
    "project_construction_category",
    "project_phase",
    "energy_code",
    "report_type",
    "reporting_year",
];

const OPTIONAL_COLUMNS: [&str; 4] = ["area_units", "climate_zone", "year", "energy_units"];
const DEFAULT_AREA_UNITS: &str = "sf";
const DEFAULT_ENERGY_UNITS: &str = "mbtu";

fn find_header_row(grid: &SheetGrid) -> Option<usize> {
    (0..HEADER_SEARCH_ROWS.min(grid.rows.len())).find(|&row| {
        let texts = grid.row_texts(row);
        SIGNATURE_COLUMNS.iter().all(|c| texts.iter().any(|t| t == c))
    })
}

/// Reads one data row into text cells keyed by header.
struct RowCells<'a> {
    values: HashMap<&'a str, String>,
    numbers: HashMap<&'a str, CellValue>,
}

impl<'a> RowCells<'a> {
    fn new(grid: &SheetGrid, row: usize, headers: &'a [String]) -> Self {
        let mut values = HashMap::new();
        let mut numbers = HashMap::new();
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let cell = grid.cell(row, col).cloned().unwrap_or(CellValue::Empty);
            if !cell.is_empty() {
                values.insert(header.as_str(), cell.as_text());
                numbers.insert(header.as_str(), cell);
            }
        }
        Self { values, numbers }
    }

    fn text(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    fn number(&self, column: &str) -> Option<f64> {
        match self.numbers.get(column)? {
            CellValue::Number(n) => Some(*n),
            other => match parse_number(&other.as_text()) {
                CellNumber::Value(v) => Some(v),
                _ => None,
            },
        }
    }
}

fn row_error(row: usize, field: &str, message: String) -> ValidationError {
    ValidationError {
        row,
        project_name: None,
        field: field.to_string(),
        message,
    }
}

fn read_project(cells: &RowCells<'_>, row_number: usize) -> Result<ProjectRow, Vec<ValidationError>> {
    let mut errors = Vec::new();
    for column in REQUIRED_COLUMNS {
        if cells.text(column).is_none() {
            errors.push(row_error(row_number, column, format!("Missing required field '{}'", column)));
        }
    }

    let mut numeric = |column: &str| -> Option<f64> {
        let text = cells.text(column)?;
        let value = cells.number(column);
        if value.is_none() {
            errors.push(row_error(
                row_number,
                column,
                format!("Invalid numeric value for field '{}': {}", column, text),
            ));
        }
        value
    };
    let conditioned_area_sf = numeric("conditioned_area_sf");
    let reporting_year = numeric("reporting_year").map(|y| y.trunc() as i32);
    let year = numeric("year").map(|y| y.trunc() as i32);

    if !errors.is_empty() {
        return Err(errors);
    }

    let text = |column: &str| cells.text(column).unwrap_or_default().to_string();
    let mut project = ProjectRow {
        row_number,
        project_name: text("project_name"),
        conditioned_area_sf: conditioned_area_sf.unwrap_or_default(),
        zip_code: text("zip_code"),
        project_use_type: text("project_use_type"),
        project_construction_category: text("project_construction_category"),
        project_phase: text("project_phase"),
        energy_code: text("energy_code"),
        report_type: text("report_type"),
        reporting_year: reporting_year.unwrap_or_default(),
        area_units: cells.text("area_units").unwrap_or(DEFAULT_AREA_UNITS).to_string(),
        climate_zone: cells.text("climate_zone").map(str::to_string),
        year,
        energy_units: cells.text("energy_units").unwrap_or(DEFAULT_ENERGY_UNITS).to_string(),
        baseline_energy: BTreeMap::new(),
        design_energy: BTreeMap::new(),
        energy: BTreeMap::new(),
        extra: BTreeMap::new(),
    };

    for (column, value) in &cells.values {
        if REQUIRED_COLUMNS.contains(column) || OPTIONAL_COLUMNS.contains(column) {
            continue;
        }
        match cells.number(column) {
            Some(v) => {
                if let Some(field) = column.strip_suffix("_baseline") {
                    project.baseline_energy.insert(field.to_string(), v);
                } else if let Some(field) = column.strip_suffix("_design") {
                    project.design_energy.insert(field.to_string(), v);
                } else {
                    project.energy.insert(column.to_string(), v);
                }
            }
            None => {
                project.extra.insert(column.to_string(), value.clone());
            }
        }
    }
    Ok(project)
}

/// Reads every project row of a multi-project sheet.
///
/// # Errors
/// `LayoutNotRecognized` when no header row is found or fewer than two projects are named.
pub fn read_sheet(grid: &SheetGrid) -> ParseResult<MultiProjectSheet> {
    let header_row = find_header_row(grid)
        .ok_or_else(|| ParseError::layout("multi-project: no header row with project_name, conditioned_area_sf, project_use_type"))?;
    let headers: Vec<String> = grid.row_texts(header_row);

    let data_rows: Vec<usize> = (header_row + 1..grid.rows.len())
        .filter(|r| !grid.is_blank_row(*r))
        .collect();
    let name_col = headers.iter().position(|h| h == "project_name");
    let named = data_rows
        .iter()
        .filter(|r| {
            name_col
                .and_then(|c| grid.cell(**r, c))
                .map(|cell| !cell.is_empty())
                .unwrap_or(false)
        })
        .count();
    if named < 2 {
        return Err(ParseError::layout(format!(
            "multi-project: {} named project row(s), at least 2 required",
            named
        )));
    }

    let mut sheet = MultiProjectSheet::default();
    for (index, row) in data_rows.iter().enumerate() {
        let cells = RowCells::new(grid, *row, &headers);
        match read_project(&cells, index + 1) {
            Ok(project) => sheet.projects.push(project),
            Err(mut errors) => sheet.row_errors.append(&mut errors),
        }
    }

    info!(
        header_row,
        projects = sheet.projects.len(),
        row_errors = sheet.row_errors.len(),
        "multi-project sheet read"
    );
    Ok(sheet)
}

pub struct MultiProjectXlsxParser;

impl ReportParser for MultiProjectXlsxParser {
    fn report_type(&self) -> ReportType {
        ReportType::MultiProjectXlsx
    }

    fn parse(&self, doc: &LoadedDocument, _ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let grid = doc.sheet()?;
        let sheet = read_sheet(grid)?;
        if sheet.projects.is_empty() {
            debug!(errors = sheet.row_errors.len(), "multi-project sheet has no readable rows");
        }
        Ok(ParsedReport::MultiProject(sheet))
    }
}
