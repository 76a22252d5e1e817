// ==========================================
// EEU Ingest - multi-project row validation
// ==========================================
// Enum membership through the EnumLookup collaborator,
// then energy_units in {mbtu, gj}. Rows are validated
// concurrently; errors keep sheet row order.
// ==========================================

use crate::domain::{EnumCategory, MultiProjectSheet, ProjectBatch, ProjectRow, ValidationError};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};

pub const ALLOWED_PROJECT_ENERGY_UNITS: [&str; 2] = ["mbtu", "gj"];
const LISTED_OPTIONS: usize = 10;

// ==========================================
// EnumLookup Trait
// ==========================================
#[async_trait]
pub trait EnumLookup: Send + Sync {
    /// Valid values of one enum category, in display order.
    async fn options(&self, category: EnumCategory) -> Result<Vec<String>, String>;
}

/// In-memory enum tables. A category without a table is reported as not checked.
#[derive(Debug, Clone, Default)]
pub struct StaticEnumLookup {
    values: HashMap<EnumCategory, Vec<String>>,
}

impl StaticEnumLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: HashMap<EnumCategory, Vec<String>>) -> Self {
        Self { values }
    }

    pub fn with(mut self, category: EnumCategory, values: &[&str]) -> Self {
        self.values
            .insert(category, values.iter().map(|v| v.to_string()).collect());
        self
    }
}

#[async_trait]
impl EnumLookup for StaticEnumLookup {
    async fn options(&self, category: EnumCategory) -> Result<Vec<String>, String> {
        self.values
            .get(&category)
            .cloned()
            .ok_or_else(|| format!("no values configured for {}", category))
    }
}

fn options_hint(options: &[String]) -> String {
    let shown: Vec<&str> = options.iter().take(LISTED_OPTIONS).map(String::as_str).collect();
    let more = if options.len() > LISTED_OPTIONS { "..." } else { "" };
    format!("{}{}", shown.join(", "), more)
}

fn project_error(project: &ProjectRow, field: &str, message: String) -> ValidationError {
    ValidationError {
        row: project.row_number,
        project_name: Some(project.label()),
        field: field.to_string(),
        message,
    }
}

/// Errors and lookup warnings of one row.
struct RowCheck {
    errors: Vec<ValidationError>,
    warnings: Vec<String>,
}

async fn check_row(project: &ProjectRow, lookup: &dyn EnumLookup) -> RowCheck {
    let mut check = RowCheck {
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    for category in EnumCategory::ALL {
        let Some(value) = category.value_of(project) else {
            continue;
        };
        match lookup.options(category).await {
            Ok(options) => {
                if !options.iter().any(|o| o == value) {
                    check.errors.push(project_error(
                        project,
                        category.field(),
                        format!("Invalid {}: '{}'. Valid options: {}", category, value, options_hint(&options)),
                    ));
                }
            }
            Err(err) => {
                warn!(project = %project.label(), category = %category, error = %err, "enum lookup failed");
                check
                    .warnings
                    .push(format!("Project '{}': {} not checked ({})", project.label(), category, err));
            }
        }
    }

    let units = project.energy_units.trim().to_ascii_lowercase();
    if !ALLOWED_PROJECT_ENERGY_UNITS.contains(&units.as_str()) {
        check.errors.push(project_error(
            project,
            "energy_units",
            format!("Invalid energy_units: '{}'. Allowed: mbtu, gj", project.energy_units),
        ));
    }
    check
}

/// Validates every parsed project row.
///
/// # Returns
/// Valid rows ready for project creation, with sheet-level and validation errors in row order.
pub async fn validate_projects(sheet: MultiProjectSheet, lookup: &dyn EnumLookup) -> ProjectBatch {
    let checks = join_all(sheet.projects.iter().map(|p| check_row(p, lookup))).await;

    let mut batch = ProjectBatch {
        warnings: sheet.warnings.iter().map(|w| w.to_string()).collect(),
        ..ProjectBatch::default()
    };
    let mut errors = sheet.row_errors;

    for (project, mut check) in sheet.projects.into_iter().zip(checks) {
        batch.warnings.append(&mut check.warnings);
        if check.errors.is_empty() {
            batch.valid.push(project);
        } else {
            errors.append(&mut check.errors);
        }
    }

    // stable: sheet errors and validation errors of one row stay in insertion order
    errors.sort_by_key(|e| e.row);
    batch.errors = errors;

    info!(
        valid = batch.valid.len(),
        errors = batch.errors.len(),
        "multi-project rows validated"
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::multi_project_xlsx::{read_sheet, tests::SHEET};
    use crate::parser::LoadedDocument;

    fn lookup() -> StaticEnumLookup {
        StaticEnumLookup::new()
            .with(EnumCategory::ProjectUseType, &["Office", "School"])
            .with(EnumCategory::ConstructionCategory, &["New", "Existing"])
            .with(EnumCategory::ProjectPhase, &["Concept", "Design"])
            .with(EnumCategory::EnergyCode, &["ASHRAE 90.1-2016", "ASHRAE 90.1-2019"])
            .with(EnumCategory::ReportType, &["IESVE", "eQuest"])
    }

    fn sheet() -> MultiProjectSheet {
        let doc = LoadedDocument::from_text(SHEET, "projects.csv");
        read_sheet(doc.sheet().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_btu_row_rejected_others_pass() {
        let batch = validate_projects(sheet(), &lookup()).await;
        assert_eq!(batch.valid.len(), 2);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(
            batch.errors[0].to_string(),
            "Project 'Elm Street': Invalid energy_units: 'btu'. Allowed: mbtu, gj"
        );
    }

    #[tokio::test]
    async fn test_enum_errors_in_row_order() {
        let lookup = StaticEnumLookup::new()
            .with(EnumCategory::ProjectUseType, &["Lab"])
            .with(EnumCategory::ConstructionCategory, &["New", "Existing"])
            .with(EnumCategory::ProjectPhase, &["Concept", "Design"])
            .with(EnumCategory::EnergyCode, &["ASHRAE 90.1-2016", "ASHRAE 90.1-2019"])
            .with(EnumCategory::ReportType, &["IESVE"]);
        let batch = validate_projects(sheet(), &lookup).await;

        assert!(batch.valid.is_empty());
        let rows: Vec<usize> = batch.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![1, 2, 2, 3]);
        assert_eq!(
            batch.errors[0].message,
            "Invalid project_use_type: 'Office'. Valid options: Lab"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_category_is_warning() {
        let lookup = StaticEnumLookup::new().with(EnumCategory::ProjectUseType, &["Office", "School"]);
        let batch = validate_projects(sheet(), &lookup).await;
        assert_eq!(batch.valid.len(), 2);
        assert!(batch
            .warnings
            .iter()
            .any(|w| w == "Project 'Oak Street': energy_code not checked (no values configured for energy_code)"));
    }

    #[test]
    fn test_options_hint_truncates() {
        let options: Vec<String> = (1..=12).map(|i| format!("o{}", i)).collect();
        let hint = options_hint(&options);
        assert!(hint.ends_with("o10..."));
    }
}
