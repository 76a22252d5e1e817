// ==========================================
// EEU Ingest - multi-project spreadsheet types
// ==========================================
// Rows of a multi-project sheet go to the project-creation
// workflow instead of the single-record pipeline.
// ==========================================

use crate::domain::observation::ParseWarning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One parsed project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    /// 1-based position among the data rows of the sheet.
    pub row_number: usize,
    pub project_name: String,
    pub conditioned_area_sf: f64,
    pub zip_code: String,
    pub project_use_type: String,
    pub project_construction_category: String,
    pub project_phase: String,
    pub energy_code: String,
    pub report_type: String,
    pub reporting_year: i32,
    pub area_units: String,
    pub climate_zone: Option<String>,
    pub year: Option<i32>,
    pub energy_units: String,
    /// Columns ending in `_baseline`, suffix removed.
    pub baseline_energy: BTreeMap<String, f64>,
    /// Columns ending in `_design`, suffix removed.
    pub design_energy: BTreeMap<String, f64>,
    /// Numeric columns without a baseline/design suffix.
    pub energy: BTreeMap<String, f64>,
    /// Non-numeric extra columns kept as text.
    pub extra: BTreeMap<String, String>,
}

impl ProjectRow {
    /// Display label used in validation messages.
    pub fn label(&self) -> String {
        if self.project_name.is_empty() {
            format!("Row {}", self.row_number)
        } else {
            self.project_name.clone()
        }
    }
}

/// Row-level problem found while reading or validating a multi-project sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub project_name: Option<String>,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project_name {
            Some(name) => write!(f, "Project '{}': {}", name, self.message),
            None => write!(f, "Row {}: {}", self.row, self.message),
        }
    }
}

/// Parser output for a multi-project sheet, before enum validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiProjectSheet {
    pub projects: Vec<ProjectRow>,
    pub row_errors: Vec<ValidationError>,
    pub warnings: Vec<ParseWarning>,
}

/// Result of validating a sheet: rows ready for project creation plus every rejection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectBatch {
    pub valid: Vec<ProjectRow>,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

// ==========================================
// Enum categories checked against the lookup
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumCategory {
    ProjectUseType,
    ConstructionCategory,
    ProjectPhase,
    EnergyCode,
    ReportType,
    ClimateZone,
}

impl EnumCategory {
    pub const ALL: [EnumCategory; 6] = [
        EnumCategory::ProjectUseType,
        EnumCategory::ConstructionCategory,
        EnumCategory::ProjectPhase,
        EnumCategory::EnergyCode,
        EnumCategory::ReportType,
        EnumCategory::ClimateZone,
    ];

    /// Sheet column validated by this category.
    pub fn field(&self) -> &'static str {
        match self {
            EnumCategory::ProjectUseType => "project_use_type",
            EnumCategory::ConstructionCategory => "project_construction_category",
            EnumCategory::ProjectPhase => "project_phase",
            EnumCategory::EnergyCode => "energy_code",
            EnumCategory::ReportType => "report_type",
            EnumCategory::ClimateZone => "climate_zone",
        }
    }

    /// Value of this category's column in a row, if set.
    pub fn value_of<'a>(&self, row: &'a ProjectRow) -> Option<&'a str> {
        match self {
            EnumCategory::ProjectUseType => Some(row.project_use_type.as_str()),
            EnumCategory::ConstructionCategory => Some(row.project_construction_category.as_str()),
            EnumCategory::ProjectPhase => Some(row.project_phase.as_str()),
            EnumCategory::EnergyCode => Some(row.energy_code.as_str()),
            EnumCategory::ReportType => Some(row.report_type.as_str()),
            EnumCategory::ClimateZone => row.climate_zone.as_deref(),
        }
        .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for EnumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field())
    }
}
