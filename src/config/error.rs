// ==========================================
// EEU Ingest - configuration error types
// ==========================================
// Crosswalk tables and runtime settings
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== Crosswalk tables =====
    #[error("failed to read {file}: {message}")]
    TableRead { file: String, message: String },

    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("unknown fuel source '{fuel_source}' for field '{field}'")]
    UnknownFuelSource { field: String, fuel_source: String },

    #[error("field '{field}' does not end in its fuel suffix '{suffix}'")]
    FieldSuffixMismatch { field: String, suffix: String },

    #[error("duplicate canonical field '{0}' in field_list.csv")]
    DuplicateField(String),

    #[error("use type '{use_type}' with fuel '{fuel}' maps to both '{first}' and '{second}'")]
    AmbiguousUseType {
        use_type: String,
        fuel: String,
        first: String,
        second: String,
    },

    #[error("crosswalk key ({report}, {report_field}) maps to both '{first}' and '{second}'")]
    ConflictingMapping {
        report: String,
        report_field: String,
        first: String,
        second: String,
    },

    #[error("crosswalk entry ({report}, {report_field}) targets unknown field '{eeu_name}'")]
    UnknownCanonicalField {
        report: String,
        report_field: String,
        eeu_name: String,
    },

    #[error("energy code '{0}' is defined twice with different energy types")]
    ConflictingEnergyCode(String),

    // ===== Runtime settings =====
    #[error("invalid value for {key}: '{value}' ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

impl From<csv::Error> for ConfigError {
    fn from(err: csv::Error) -> Self {
        ConfigError::TableRead {
            file: "csv".to_string(),
            message: err.to_string(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
