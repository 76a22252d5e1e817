// ==========================================
// EEU Ingest - parser output types
// ==========================================
// Raw long-form observations, document metadata and
// non-fatal warnings produced by one parse attempt.
// ==========================================

use crate::domain::project::MultiProjectSheet;
use crate::domain::types::{AreaUnit, EnergyUnit, ReportType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Square feet per square metre.
pub const SF_PER_SM: f64 = 10.7639;

// ==========================================
// RawObservation
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub report_field: String,
    pub energy_value: f64,
    pub source_report_type: ReportType,
    /// Unit of this value when it differs from the document's declared unit.
    pub energy_unit: Option<EnergyUnit>,
}

impl RawObservation {
    pub fn new(report_field: impl Into<String>, energy_value: f64, source_report_type: ReportType) -> Self {
        Self {
            report_field: report_field.into(),
            energy_value,
            source_report_type,
            energy_unit: None,
        }
    }

    pub fn with_unit(mut self, unit: EnergyUnit) -> Self {
        self.energy_unit = Some(unit);
        self
    }

    pub fn effective_unit(&self, declared: EnergyUnit) -> EnergyUnit {
        self.energy_unit.unwrap_or(declared)
    }
}

// ==========================================
// DocumentMetadata
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub energy_units_declared: EnergyUnit,
    /// Always > 0 when present.
    pub conditioned_area: Option<f64>,
    pub area_units: AreaUnit,
    pub weather_string: String,
    pub project_name: Option<String>,
    pub report_type: ReportType,
}

impl DocumentMetadata {
    pub fn new(report_type: ReportType, energy_units_declared: EnergyUnit) -> Self {
        Self {
            energy_units_declared,
            conditioned_area: None,
            area_units: AreaUnit::Sf,
            weather_string: String::new(),
            project_name: None,
            report_type,
        }
    }

    /// Records the area only when it is a positive number.
    pub fn set_conditioned_area(&mut self, area: f64, units: AreaUnit) {
        if area.is_finite() && area > 0.0 {
            self.conditioned_area = Some(area);
            self.area_units = units;
        }
    }

    pub fn conditioned_area_sf(&self) -> Option<f64> {
        self.conditioned_area.map(|area| match self.area_units {
            AreaUnit::Sf => area,
            AreaUnit::Sm => area * SF_PER_SM,
        })
    }
}

// ==========================================
// ParseWarning
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    UnmappedField,
    SumMismatch,
    NonNumericCell,
    MissingMetadata,
    UnitMismatch,
    ParserAttemptFailed,
    UnknownEnergyCode,
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningCode::UnmappedField => "UNMAPPED_FIELD",
            WarningCode::SumMismatch => "SUM_MISMATCH",
            WarningCode::NonNumericCell => "NON_NUMERIC_CELL",
            WarningCode::MissingMetadata => "MISSING_METADATA",
            WarningCode::UnitMismatch => "UNIT_MISMATCH",
            WarningCode::ParserAttemptFailed => "PARSER_ATTEMPT_FAILED",
            WarningCode::UnknownEnergyCode => "UNKNOWN_ENERGY_CODE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub code: WarningCode,
    pub message: String,
}

impl ParseWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// ==========================================
// Parse results
// ==========================================

/// Long-form energy table extracted from a single-project report.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEnergyReport {
    pub observations: Vec<RawObservation>,
    pub metadata: DocumentMetadata,
    pub warnings: Vec<ParseWarning>,
}

/// Successful output of a format parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReport {
    Energy(ParsedEnergyReport),
    MultiProject(MultiProjectSheet),
}

impl ParsedReport {
    pub fn report_type(&self) -> ReportType {
        match self {
            ParsedReport::Energy(report) => report.metadata.report_type,
            ParsedReport::MultiProject(_) => ReportType::MultiProjectXlsx,
        }
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        match self {
            ParsedReport::Energy(report) => &report.warnings,
            ParsedReport::MultiProject(sheet) => &sheet.warnings,
        }
    }

    pub fn warnings_mut(&mut self) -> &mut Vec<ParseWarning> {
        match self {
            ParsedReport::Energy(report) => &mut report.warnings,
            ParsedReport::MultiProject(sheet) => &mut sheet.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditioned_area_rejects_non_positive() {
        let mut meta = DocumentMetadata::new(ReportType::GenericXlsx, EnergyUnit::Mbtu);
        meta.set_conditioned_area(0.0, AreaUnit::Sf);
        assert_eq!(meta.conditioned_area, None);
        meta.set_conditioned_area(-5.0, AreaUnit::Sf);
        assert_eq!(meta.conditioned_area_sf(), None);
    }

    #[test]
    fn test_conditioned_area_sm_to_sf() {
        let mut meta = DocumentMetadata::new(ReportType::EnergyPlus, EnergyUnit::Gj);
        meta.set_conditioned_area(100.0, AreaUnit::Sm);
        let sf = meta.conditioned_area_sf().unwrap();
        assert!((sf - 1076.39).abs() < 1e-9);
    }
}
