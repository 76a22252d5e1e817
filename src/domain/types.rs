// ==========================================
// EEU Ingest - domain type definitions
// ==========================================
// Report types, units, fuel categories and the
// baseline/design switch shared by every layer.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Report Type
// ==========================================
// Numeric codes are part of the upload contract (7 is unused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Iesve,            // 1
    EnergyPlus,       // 2
    EquestSim,        // 3
    GenericXlsx,      // 4
    EquestBeps,       // 5
    EquestStandard,   // 6
    IesvePrm,         // 8
    MultiProjectXlsx, // 9
}

impl ReportType {
    /// Every supported report type, ordered by code.
    pub const ALL: [ReportType; 8] = [
        ReportType::Iesve,
        ReportType::EnergyPlus,
        ReportType::EquestSim,
        ReportType::GenericXlsx,
        ReportType::EquestBeps,
        ReportType::EquestStandard,
        ReportType::IesvePrm,
        ReportType::MultiProjectXlsx,
    ];

    pub fn code(&self) -> u8 {
        match self {
            ReportType::Iesve => 1,
            ReportType::EnergyPlus => 2,
            ReportType::EquestSim => 3,
            ReportType::GenericXlsx => 4,
            ReportType::EquestBeps => 5,
            ReportType::EquestStandard => 6,
            ReportType::IesvePrm => 8,
            ReportType::MultiProjectXlsx => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Key of this report type in `column_mapping.csv`.
    ///
    /// eQuest SIM text shares the BEPS field labels and therefore the BEPS crosswalk.
    pub fn crosswalk_key(&self) -> &'static str {
        match self {
            ReportType::Iesve => "iesve",
            ReportType::EnergyPlus => "eplus",
            ReportType::EquestSim => "equest_beps",
            ReportType::GenericXlsx => "xlsx",
            ReportType::EquestBeps => "equest_beps",
            ReportType::EquestStandard => "equest_standard",
            ReportType::IesvePrm => "iesve_prm",
            ReportType::MultiProjectXlsx => "multi_project",
        }
    }

    /// File type label stored with an upload.
    pub fn file_type(&self) -> &'static str {
        match self {
            ReportType::Iesve | ReportType::EquestBeps | ReportType::EquestStandard | ReportType::IesvePrm => "pdf",
            ReportType::EnergyPlus => "html",
            ReportType::EquestSim => "sim",
            ReportType::GenericXlsx | ReportType::MultiProjectXlsx => "xlsx",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Iesve => write!(f, "IES-VE"),
            ReportType::EnergyPlus => write!(f, "EnergyPlus"),
            ReportType::EquestSim => write!(f, "eQuest-SIM"),
            ReportType::GenericXlsx => write!(f, "Generic-XLSX"),
            ReportType::EquestBeps => write!(f, "eQuest-BEPS"),
            ReportType::EquestStandard => write!(f, "eQuest-Standard"),
            ReportType::IesvePrm => write!(f, "IES-VE-PRM"),
            ReportType::MultiProjectXlsx => write!(f, "Multi-Project-XLSX"),
        }
    }
}

// ==========================================
// Energy Unit
// ==========================================
// Canonical internal unit is MBtu (million Btu).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyUnit {
    Mbtu,
    Gj,
    Kbtu,
    Mwh,
}

impl EnergyUnit {
    /// Parses a unit label as written in reports and sheets (case-insensitive).
    ///
    /// `mmbtu` is accepted as a spelling of MBtu.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "mbtu" | "mmbtu" => Some(EnergyUnit::Mbtu),
            "gj" => Some(EnergyUnit::Gj),
            "kbtu" => Some(EnergyUnit::Kbtu),
            "mwh" => Some(EnergyUnit::Mwh),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyUnit::Mbtu => "mbtu",
            EnergyUnit::Gj => "gj",
            EnergyUnit::Kbtu => "kbtu",
            EnergyUnit::Mwh => "mwh",
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Area Unit
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    Sf, // square feet
    Sm, // square metres
}

impl AreaUnit {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "sf" | "ft2" | "ft²" | "sqft" | "sq ft" => Some(AreaUnit::Sf),
            "sm" | "m2" | "m²" | "sqm" | "sq m" => Some(AreaUnit::Sm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaUnit::Sf => "sf",
            AreaUnit::Sm => "sm",
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Fuel Category
// ==========================================
// Output columns use the suffix form (`total_NaturalGas`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelCategory {
    Electricity,
    FossilFuels,
    District,
    Other,
    OnsiteRenewables,
}

impl FuelCategory {
    pub const ALL: [FuelCategory; 5] = [
        FuelCategory::Electricity,
        FuelCategory::FossilFuels,
        FuelCategory::District,
        FuelCategory::Other,
        FuelCategory::OnsiteRenewables,
    ];

    /// Suffix used in canonical field names and total columns.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            FuelCategory::Electricity => "Electricity",
            FuelCategory::FossilFuels => "NaturalGas",
            FuelCategory::District => "DistrictHeating",
            FuelCategory::Other => "Other",
            FuelCategory::OnsiteRenewables => "On-SiteRenewables",
        }
    }

    /// Accepts either the column suffix or the snake_case category name.
    pub fn from_fuel_source(source: &str) -> Option<Self> {
        let source = source.trim();
        Self::ALL.iter().copied().find(|c| {
            c.column_suffix().eq_ignore_ascii_case(source)
                || serde_json::to_value(c)
                    .ok()
                    .and_then(|v| v.as_str().map(|s| s.eq_ignore_ascii_case(source)))
                    .unwrap_or(false)
        })
    }

    pub fn total_column(&self) -> String {
        format!("total_{}", self.column_suffix())
    }

    pub fn is_renewable(&self) -> bool {
        matches!(self, FuelCategory::OnsiteRenewables)
    }
}

impl fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_suffix())
    }
}

// ==========================================
// Baseline / Design
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineDesign {
    Baseline,
    #[default]
    Design,
}

impl BaselineDesign {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "baseline" => Some(BaselineDesign::Baseline),
            "design" | "proposed" => Some(BaselineDesign::Design),
            _ => None,
        }
    }
}

impl fmt::Display for BaselineDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineDesign::Baseline => write!(f, "baseline"),
            BaselineDesign::Design => write!(f, "design"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_codes() {
        for t in ReportType::ALL {
            assert_eq!(ReportType::from_code(t.code()), Some(t));
        }
        assert_eq!(ReportType::from_code(7), None);
        assert_eq!(ReportType::EquestSim.crosswalk_key(), "equest_beps");
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(EnergyUnit::from_label("MMBtu"), Some(EnergyUnit::Mbtu));
        assert_eq!(EnergyUnit::from_label(" GJ "), Some(EnergyUnit::Gj));
        assert_eq!(EnergyUnit::from_label("btu"), None);
        assert_eq!(AreaUnit::from_label("m2"), Some(AreaUnit::Sm));
    }

    #[test]
    fn test_fuel_category_suffixes() {
        assert_eq!(FuelCategory::from_fuel_source("NaturalGas"), Some(FuelCategory::FossilFuels));
        assert_eq!(FuelCategory::from_fuel_source("fossil_fuels"), Some(FuelCategory::FossilFuels));
        assert_eq!(
            FuelCategory::from_fuel_source("On-SiteRenewables"),
            Some(FuelCategory::OnsiteRenewables)
        );
        assert_eq!(FuelCategory::District.total_column(), "total_DistrictHeating");
        assert_eq!(FuelCategory::from_fuel_source("steam"), None);
    }
}
