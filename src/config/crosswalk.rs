// ==========================================
// EEU Ingest - crosswalk configuration
// ==========================================
// Sources: field_list.csv / column_mapping.csv / energy_codes.csv
// Built once, shared read-only as Arc<CrosswalkConfig>.
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::{FuelCategory, ReportType};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const FIELD_LIST_FILE: &str = "field_list.csv";
pub const COLUMN_MAPPING_FILE: &str = "column_mapping.csv";
pub const ENERGY_CODES_FILE: &str = "energy_codes.csv";

const BUNDLED_FIELD_LIST: &str = include_str!("../../dependencies/field_list.csv");
const BUNDLED_COLUMN_MAPPING: &str = include_str!("../../dependencies/column_mapping.csv");
const BUNDLED_ENERGY_CODES: &str = include_str!("../../dependencies/energy_codes.csv");

// ==========================================
// CSV rows
// ==========================================
#[derive(Debug, Deserialize)]
struct FieldListRow {
    field: String,
    fuel_source: String,
    higher_level_grouping: String,
}

#[derive(Debug, Deserialize)]
struct ColumnMappingRow {
    report: String,
    report_field: String,
    eeu_name: String,
}

#[derive(Debug, Deserialize)]
struct EnergyCodeRow {
    code: String,
    energy_type: String,
}

// ==========================================
// CanonicalField
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalField {
    pub eeu_name: String,
    pub fuel_category: FuelCategory,
    pub use_type: String,
    pub higher_level_grouping: String,
}

/// A report label reduced to its crosswalk key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLabel {
    pub key: String,
    /// Text of a trailing `[unit]` tag, if the label carried one.
    pub unit_tag: Option<String>,
}

/// Trims, collapses inner whitespace and strips a trailing `[unit]` tag.
pub fn normalize_label(label: &str) -> NormalizedLabel {
    let mut text = label.trim();
    let mut unit_tag = None;

    if text.ends_with(']') {
        if let Some(open) = text.rfind('[') {
            let tag = text[open + 1..text.len() - 1].trim();
            if !tag.is_empty() {
                unit_tag = Some(tag.to_string());
            }
            text = text[..open].trim_end();
        }
    }

    NormalizedLabel {
        key: text.split_whitespace().collect::<Vec<_>>().join(" "),
        unit_tag,
    }
}

// ==========================================
// CrosswalkConfig
// ==========================================
#[derive(Debug, Clone)]
pub struct CrosswalkConfig {
    fields: Vec<CanonicalField>,
    field_index: HashMap<String, usize>,
    /// report key -> normalized report field -> index into `fields`
    mappings: HashMap<String, HashMap<String, usize>>,
    energy_codes: HashMap<String, String>,
}

impl CrosswalkConfig {
    /// Crosswalk compiled into the binary from `dependencies/`.
    pub fn bundled() -> ConfigResult<Self> {
        Self::from_readers(
            BUNDLED_FIELD_LIST.as_bytes(),
            BUNDLED_COLUMN_MAPPING.as_bytes(),
            BUNDLED_ENERGY_CODES.as_bytes(),
        )
    }

    /// Loads the three crosswalk tables from a directory.
    pub fn load_from_dir(dir: &Path) -> ConfigResult<Self> {
        info!(dir = %dir.display(), "loading crosswalk tables");
        let open = |name: &str| {
            File::open(dir.join(name)).map_err(|e| ConfigError::TableRead {
                file: dir.join(name).display().to_string(),
                message: e.to_string(),
            })
        };
        Self::from_readers(
            open(FIELD_LIST_FILE)?,
            open(COLUMN_MAPPING_FILE)?,
            open(ENERGY_CODES_FILE)?,
        )
    }

    /// Builds and validates a crosswalk from CSV sources.
    ///
    /// # Errors
    /// - unknown fuel source, duplicate field, or a field whose suffix disagrees with its fuel
    /// - two fields sharing one (use_type, fuel_category) pair
    /// - a crosswalk key mapped to two different canonical fields
    /// - a crosswalk entry naming a field absent from the field list
    pub fn from_readers<F: Read, M: Read, E: Read>(
        field_list: F,
        column_mapping: M,
        energy_codes: E,
    ) -> ConfigResult<Self> {
        let field_rows: Vec<FieldListRow> = read_rows(FIELD_LIST_FILE, field_list)?;
        let mapping_rows: Vec<ColumnMappingRow> = read_rows(COLUMN_MAPPING_FILE, column_mapping)?;
        let code_rows: Vec<EnergyCodeRow> = read_rows(ENERGY_CODES_FILE, energy_codes)?;

        let mut fields = Vec::with_capacity(field_rows.len());
        let mut field_index = HashMap::new();
        let mut use_type_index: HashMap<(String, FuelCategory), String> = HashMap::new();

        for row in field_rows {
            let eeu_name = row.field.trim().to_string();
            let fuel_category = FuelCategory::from_fuel_source(&row.fuel_source).ok_or_else(|| {
                ConfigError::UnknownFuelSource {
                    field: eeu_name.clone(),
                    fuel_source: row.fuel_source.clone(),
                }
            })?;

            let suffix = format!("_{}", fuel_category.column_suffix());
            let use_type = eeu_name
                .strip_suffix(&suffix)
                .ok_or_else(|| ConfigError::FieldSuffixMismatch {
                    field: eeu_name.clone(),
                    suffix: fuel_category.column_suffix().to_string(),
                })?
                .to_string();

            if field_index.contains_key(&eeu_name) {
                return Err(ConfigError::DuplicateField(eeu_name));
            }
            if let Some(first) = use_type_index.get(&(use_type.clone(), fuel_category)) {
                return Err(ConfigError::AmbiguousUseType {
                    use_type,
                    fuel: fuel_category.to_string(),
                    first: first.clone(),
                    second: eeu_name,
                });
            }

            use_type_index.insert((use_type.clone(), fuel_category), eeu_name.clone());
            field_index.insert(eeu_name.clone(), fields.len());
            fields.push(CanonicalField {
                eeu_name,
                fuel_category,
                use_type,
                higher_level_grouping: row.higher_level_grouping.trim().to_string(),
            });
        }

        let mut mappings: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for row in mapping_rows {
            let report = row.report.trim().to_string();
            let key = normalize_label(&row.report_field).key;
            let target = row.eeu_name.trim();
            let idx = *field_index
                .get(target)
                .ok_or_else(|| ConfigError::UnknownCanonicalField {
                    report: report.clone(),
                    report_field: key.clone(),
                    eeu_name: target.to_string(),
                })?;

            let table = mappings.entry(report.clone()).or_default();
            match table.get(&key) {
                Some(&existing) if existing != idx => {
                    return Err(ConfigError::ConflictingMapping {
                        report,
                        report_field: key,
                        first: fields[existing].eeu_name.clone(),
                        second: target.to_string(),
                    });
                }
                Some(_) => debug!(report = %report, report_field = %key, "duplicate crosswalk entry ignored"),
                None => {
                    table.insert(key, idx);
                }
            }
        }

        let mut codes = HashMap::new();
        for row in code_rows {
            let code = row.code.trim().to_string();
            let energy_type = row.energy_type.trim().to_string();
            match codes.get(&code) {
                Some(existing) if existing != &energy_type => {
                    return Err(ConfigError::ConflictingEnergyCode(code));
                }
                _ => {
                    codes.insert(code, energy_type);
                }
            }
        }

        info!(
            fields = fields.len(),
            reports = mappings.len(),
            energy_codes = codes.len(),
            "crosswalk loaded"
        );

        Ok(Self {
            fields,
            field_index,
            mappings,
            energy_codes: codes,
        })
    }

    /// Canonical fields in field-list order.
    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    pub fn field(&self, eeu_name: &str) -> Option<&CanonicalField> {
        self.field_index.get(eeu_name).map(|&i| &self.fields[i])
    }

    /// Exact lookup of a normalized report label.
    pub fn lookup(&self, report_type: ReportType, report_field: &str) -> Option<&CanonicalField> {
        let key = normalize_label(report_field).key;
        self.mappings
            .get(report_type.crosswalk_key())
            .and_then(|table| table.get(&key))
            .map(|&i| &self.fields[i])
    }

    pub fn has_report(&self, report_type: ReportType) -> bool {
        self.mappings.contains_key(report_type.crosswalk_key())
    }

    /// Number of crosswalk entries for one report key.
    pub fn mapping_count(&self, report_key: &str) -> usize {
        self.mappings.get(report_key).map(|t| t.len()).unwrap_or(0)
    }

    /// eQuest meter code -> energy type (`elec`, `gas`, `other`).
    pub fn energy_type_for_code(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.energy_codes
            .get(code)
            .or_else(|| {
                self.energy_codes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(code))
                    .map(|(_, v)| v)
            })
            .map(|s| s.as_str())
    }
}

fn read_rows<T: DeserializeOwned, R: Read>(file: &str, reader: R) -> ConfigResult<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let row = result.map_err(|e| ConfigError::TableRead {
            file: file.to_string(),
            message: format!("row {}: {}", idx + 2, e),
        })?;
        rows.push(row);
    }
    Ok(rows)
}
