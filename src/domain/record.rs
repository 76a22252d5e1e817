// ==========================================
// EEU Ingest - normalized output records
// ==========================================
// NormalizedRecord: pivoted per-end-use row (MBtu)
// UploadRecord: what the persistence collaborator stores
// ==========================================

use crate::domain::types::{AreaUnit, BaselineDesign, EnergyUnit, FuelCategory, ReportType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Audit pair: the value as printed in the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedValue {
    pub report_field: String,
    pub eeu_name: String,
    pub energy_value_report: f64,
    pub energy_units_report: EnergyUnit,
    pub energy_value_mbtu: f64,
}

// ==========================================
// NormalizedRecord
// ==========================================
// Invariant: total_energy = max(0, sum(non-renewable totals) - total_On-SiteRenewables)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// eeu_name -> MBtu, only canonical fields present in the document.
    pub fields: BTreeMap<String, f64>,
    pub totals: BTreeMap<FuelCategory, f64>,
    pub total_energy: f64,
    /// Unclamped total; negative for net energy producers.
    pub net_energy: f64,
    pub conditioned_area_sf: Option<f64>,
    /// Unit of `conditioned_area_sf`; always sf.
    pub area_units: AreaUnit,
    /// Area unit as printed in the source document.
    pub area_units_report: AreaUnit,
    pub energy_units: EnergyUnit,
    pub weather_string: String,
    pub report_type: ReportType,
    pub project_name: Option<String>,
    pub use_type_total_area: Option<f64>,
    /// kBtu/sf per field and per total column; empty without an area.
    pub eui_kbtu_per_sf: BTreeMap<String, f64>,
    pub reported_values: Vec<ReportedValue>,
    pub unmapped_fields: Vec<String>,
}

impl NormalizedRecord {
    pub fn field(&self, eeu_name: &str) -> Option<f64> {
        self.fields.get(eeu_name).copied()
    }

    pub fn total(&self, category: FuelCategory) -> f64 {
        self.totals.get(&category).copied().unwrap_or(0.0)
    }

    /// Flattens the record into named output columns.
    pub fn to_columns(&self) -> Map<String, Value> {
        let mut row = Map::new();
        for (name, value) in &self.fields {
            row.insert(name.clone(), Value::from(*value));
        }
        for category in FuelCategory::ALL {
            row.insert(category.total_column(), Value::from(self.total(category)));
        }
        row.insert("total_energy".into(), Value::from(self.total_energy));
        row.insert("net_energy".into(), Value::from(self.net_energy));
        row.insert("conditioned_area_sf".into(), option_number(self.conditioned_area_sf));
        row.insert("area_units".into(), Value::from(self.area_units.as_str()));
        row.insert("area_units_report".into(), Value::from(self.area_units_report.as_str()));
        row.insert("energy_units".into(), Value::from(self.energy_units.as_str()));
        row.insert("weather_string".into(), Value::from(self.weather_string.clone()));
        row.insert("report_type".into(), Value::from(self.report_type.code()));
        row.insert(
            "project_name".into(),
            self.project_name.clone().map(Value::from).unwrap_or(Value::Null),
        );
        row.insert("use_type_total_area".into(), option_number(self.use_type_total_area));
        row
    }
}

fn option_number(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

// ==========================================
// WeatherInfo
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub climate_zone: Option<String>,
    pub egrid_subregion: Option<String>,
}

// ==========================================
// UploadRecord
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub record: NormalizedRecord,
    pub weather: WeatherInfo,
    /// Newline-joined warning messages.
    pub upload_warnings: String,
    /// Newline-joined error messages.
    pub upload_errors: String,
    pub file_type: String,
    pub file_name: String,
    pub file_url: String,
    pub baseline_design: BaselineDesign,
    pub created_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Flat row handed to storage: record columns plus upload bookkeeping.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = self.record.to_columns();
        row.insert("id".into(), Value::from(self.id.clone()));
        row.insert("city".into(), opt_string(&self.weather.city));
        row.insert("state".into(), opt_string(&self.weather.state));
        row.insert("zip_code".into(), opt_string(&self.weather.zip_code));
        row.insert("climate_zone".into(), opt_string(&self.weather.climate_zone));
        row.insert("egrid_subregion".into(), opt_string(&self.weather.egrid_subregion));
        row.insert("upload_warnings".into(), Value::from(self.upload_warnings.clone()));
        row.insert("upload_errors".into(), Value::from(self.upload_errors.clone()));
        row.insert("file_type".into(), Value::from(self.file_type.clone()));
        row.insert("file_name".into(), Value::from(self.file_name.clone()));
        row.insert("file_url".into(), Value::from(self.file_url.clone()));
        row.insert("baseline_design".into(), Value::from(self.baseline_design.to_string()));
        row.insert("created_at".into(), Value::from(self.created_at.to_rfc3339()));
        row
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::from).unwrap_or(Value::Null)
}
