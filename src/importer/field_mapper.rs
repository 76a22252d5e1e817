// ==========================================
// EEU Ingest - crosswalk mapper
// ==========================================
// report label -> normalized key -> canonical field
// Unmapped labels are dropped from totals but always
// recorded and warned about.
// ==========================================

use crate::config::{normalize_label, CanonicalField, CrosswalkConfig};
use crate::domain::{EnergyUnit, ParseWarning, RawObservation, ReportType, WarningCode};
use tracing::{debug, warn};

/// One observation resolved to a canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedObservation {
    pub field: CanonicalField,
    pub report_field: String,
    pub value: f64,
    pub unit: EnergyUnit,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingOutcome {
    pub mapped: Vec<MappedObservation>,
    /// Labels with no crosswalk entry, in document order, each listed once.
    pub unmapped: Vec<String>,
    pub warnings: Vec<ParseWarning>,
}

pub struct FieldMapper<'a> {
    crosswalk: &'a CrosswalkConfig,
}

impl<'a> FieldMapper<'a> {
    pub fn new(crosswalk: &'a CrosswalkConfig) -> Self {
        Self { crosswalk }
    }

    /// Maps observations of one document.
    ///
    /// # Arguments
    /// - observations: parser output
    /// - report_type: selects the crosswalk table
    /// - declared: the document's declared energy unit
    pub fn map(&self, observations: &[RawObservation], report_type: ReportType, declared: EnergyUnit) -> MappingOutcome {
        let mut outcome = MappingOutcome::default();

        for obs in observations {
            let label = normalize_label(&obs.report_field);
            let unit = obs.effective_unit(declared);

            if let Some(tag) = &label.unit_tag {
                match EnergyUnit::from_label(tag) {
                    Some(tagged) if tagged != unit => outcome.warnings.push(ParseWarning::new(
                        WarningCode::UnitMismatch,
                        format!(
                            "{}: label unit '{}' differs from document unit '{}'; document unit used",
                            label.key, tag, unit
                        ),
                    )),
                    _ => {}
                }
            }

            match self.crosswalk.lookup(report_type, &label.key) {
                Some(field) => outcome.mapped.push(MappedObservation {
                    field: field.clone(),
                    report_field: obs.report_field.clone(),
                    value: obs.energy_value,
                    unit,
                }),
                None => {
                    if !outcome.unmapped.contains(&label.key) {
                        warn!(report_type = %report_type, field = %label.key, "unmapped report field");
                        outcome.warnings.push(ParseWarning::new(
                            WarningCode::UnmappedField,
                            format!("{}: no crosswalk entry for '{}'; excluded from totals", report_type, label.key),
                        ));
                        outcome.unmapped.push(label.key);
                    }
                }
            }
        }

        debug!(
            report_type = %report_type,
            mapped = outcome.mapped.len(),
            unmapped = outcome.unmapped.len(),
            "crosswalk applied"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FuelCategory;

    const FIELDS: &str = "field,fuel_source,higher_level_grouping\n\
                          Heating_Electricity,Electricity,HVAC\n\
                          Heating_NaturalGas,NaturalGas,HVAC\n";
    const MAPPING: &str = "report,report_field,eeu_name\n\
                           eplus,Heating_Electricity,Heating_Electricity\n\
                           eplus,Heating_NaturalGas,Heating_NaturalGas\n";
    const CODES: &str = "code,energy_type\nEM1,elec\n";

    fn fixture() -> CrosswalkConfig {
        CrosswalkConfig::from_readers(FIELDS.as_bytes(), MAPPING.as_bytes(), CODES.as_bytes()).unwrap()
    }

    #[test]
    fn test_maps_and_records_unmapped() {
        let cw = fixture();
        let observations = vec![
            RawObservation::new("  Heating_Electricity ", 10.0, ReportType::EnergyPlus),
            RawObservation::new("Heating_NaturalGas", 5.0, ReportType::EnergyPlus),
            RawObservation::new("Fans_Electricity", 1.0, ReportType::EnergyPlus),
            RawObservation::new("Fans_Electricity", 2.0, ReportType::EnergyPlus),
        ];
        let outcome = FieldMapper::new(&cw).map(&observations, ReportType::EnergyPlus, EnergyUnit::Gj);

        assert_eq!(outcome.mapped.len(), 2);
        assert_eq!(outcome.mapped[1].field.fuel_category, FuelCategory::FossilFuels);
        assert_eq!(outcome.mapped[0].unit, EnergyUnit::Gj);
        assert_eq!(outcome.unmapped, vec!["Fans_Electricity".to_string()]);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, WarningCode::UnmappedField);
    }

    #[test]
    fn test_unit_tag_cross_checked() {
        let cw = fixture();
        let observations = vec![
            RawObservation::new("Heating_Electricity [kBtu]", 10.0, ReportType::EnergyPlus),
            RawObservation::new("Heating_NaturalGas [GJ]", 5.0, ReportType::EnergyPlus),
        ];
        let outcome = FieldMapper::new(&cw).map(&observations, ReportType::EnergyPlus, EnergyUnit::Gj);
        assert_eq!(outcome.mapped.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, WarningCode::UnitMismatch);
        assert_eq!(outcome.mapped[0].unit, EnergyUnit::Gj);
    }
}
