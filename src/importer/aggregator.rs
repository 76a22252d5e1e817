// ==========================================
// EEU Ingest - aggregator / output assembler
// ==========================================
// mapped observations (report unit) -> MBtu -> pivoted record
// total_energy = max(0, non-renewable totals - renewables)
// ==========================================

use crate::domain::{
    AreaUnit, DocumentMetadata, EnergyUnit, FuelCategory, NormalizedRecord, ParseWarning, ReportedValue, WarningCode,
};
use crate::importer::field_mapper::MappingOutcome;
use crate::importer::unit_normalizer::{eui_kbtu_per_sf, to_mbtu};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Assembled record plus the warnings raised while assembling it.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub record: NormalizedRecord,
    pub warnings: Vec<ParseWarning>,
}

/// Sums category totals into (clamped total, unclamped net).
pub fn total_energy(totals: &BTreeMap<FuelCategory, f64>) -> (f64, f64) {
    let net = totals
        .iter()
        .map(|(category, v)| if category.is_renewable() { -v } else { *v })
        .sum::<f64>();
    (net.max(0.0), net)
}

/// Builds the normalized record for one document.
///
/// # Arguments
/// - mapping: crosswalk output, values still in their report unit
/// - metadata: document metadata (area, weather, project name)
pub fn assemble(mapping: MappingOutcome, metadata: &DocumentMetadata) -> Assembled {
    let mut warnings = Vec::new();
    let mut fields: BTreeMap<String, f64> = BTreeMap::new();
    let mut totals: BTreeMap<FuelCategory, f64> = FuelCategory::ALL.iter().map(|c| (*c, 0.0)).collect();
    let mut reported_values = Vec::with_capacity(mapping.mapped.len());

    for obs in mapping.mapped {
        let mbtu = to_mbtu(obs.value, obs.unit);
        *fields.entry(obs.field.eeu_name.clone()).or_insert(0.0) += mbtu;
        *totals.entry(obs.field.fuel_category).or_insert(0.0) += mbtu;
        reported_values.push(ReportedValue {
            report_field: obs.report_field,
            eeu_name: obs.field.eeu_name,
            energy_value_report: obs.value,
            energy_units_report: obs.unit,
            energy_value_mbtu: mbtu,
        });
    }

    let (total, net) = total_energy(&totals);
    let area_sf = metadata.conditioned_area_sf();

    let mut eui = BTreeMap::new();
    match area_sf {
        Some(area) => {
            for (name, value) in &fields {
                if let Some(v) = eui_kbtu_per_sf(*value, area) {
                    eui.insert(name.clone(), v);
                }
            }
            for (category, value) in &totals {
                if let Some(v) = eui_kbtu_per_sf(*value, area) {
                    eui.insert(category.total_column(), v);
                }
            }
            if let Some(v) = eui_kbtu_per_sf(total, area) {
                eui.insert("total_energy".to_string(), v);
            }
        }
        None => warnings.push(ParseWarning::new(
            WarningCode::MissingMetadata,
            format!("{}: no conditioned area; per-area values skipped", metadata.report_type),
        )),
    }

    debug!(fields = fields.len(), total, net, "fuel totals computed");
    info!(
        report_type = %metadata.report_type,
        fields = fields.len(),
        unmapped = mapping.unmapped.len(),
        total_energy = total,
        "record assembled"
    );

    let record = NormalizedRecord {
        fields,
        totals,
        total_energy: total,
        net_energy: net,
        conditioned_area_sf: area_sf,
        area_units: AreaUnit::Sf,
        area_units_report: metadata.area_units,
        energy_units: EnergyUnit::Mbtu,
        weather_string: metadata.weather_string.clone(),
        report_type: metadata.report_type,
        project_name: metadata.project_name.clone(),
        use_type_total_area: area_sf,
        eui_kbtu_per_sf: eui,
        reported_values,
        unmapped_fields: mapping.unmapped,
    };

    Assembled { record, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanonicalField;
    use crate::domain::ReportType;
    use crate::importer::field_mapper::MappedObservation;

    fn mapped(name: &str, category: FuelCategory, value: f64, unit: EnergyUnit) -> MappedObservation {
        MappedObservation {
            field: CanonicalField {
                eeu_name: name.to_string(),
                fuel_category: category,
                use_type: name.split('_').next().unwrap_or_default().to_string(),
                higher_level_grouping: "HVAC".to_string(),
            },
            report_field: name.to_string(),
            value,
            unit,
        }
    }

    fn metadata(area: Option<f64>) -> DocumentMetadata {
        let mut meta = DocumentMetadata::new(ReportType::GenericXlsx, EnergyUnit::Gj);
        if let Some(a) = area {
            meta.set_conditioned_area(a, AreaUnit::Sf);
        }
        meta
    }

    #[test]
    fn test_totals_and_audit_pairs() {
        let mapping = MappingOutcome {
            mapped: vec![
                mapped("Heating_Electricity", FuelCategory::Electricity, 10.0, EnergyUnit::Gj),
                mapped("Heating_NaturalGas", FuelCategory::FossilFuels, 2000.0, EnergyUnit::Kbtu),
            ],
            unmapped: vec!["Mystery".to_string()],
            warnings: Vec::new(),
        };
        let out = assemble(mapping, &metadata(Some(1000.0)));
        let r = &out.record;

        assert!((r.field("Heating_Electricity").unwrap() - 9.47817).abs() < 1e-9);
        assert!((r.total(FuelCategory::FossilFuels) - 2.0).abs() < 1e-9);
        assert!((r.total_energy - 11.47817).abs() < 1e-9);
        assert_eq!(r.energy_units, EnergyUnit::Mbtu);
        assert_eq!(r.reported_values[0].energy_value_report, 10.0);
        assert_eq!(r.reported_values[0].energy_units_report, EnergyUnit::Gj);
        assert_eq!(r.unmapped_fields, vec!["Mystery".to_string()]);
        assert!((r.eui_kbtu_per_sf["Heating_NaturalGas"] - 2.0).abs() < 1e-9);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_renewables_clamp_total_but_keep_net() {
        let mapping = MappingOutcome {
            mapped: vec![
                mapped("Lighting_Electricity", FuelCategory::Electricity, 5.0, EnergyUnit::Mbtu),
                mapped("SolarPV_On-SiteRenewables", FuelCategory::OnsiteRenewables, 8.0, EnergyUnit::Mbtu),
            ],
            ..MappingOutcome::default()
        };
        let out = assemble(mapping, &metadata(Some(100.0)));
        assert_eq!(out.record.total_energy, 0.0);
        assert_eq!(out.record.net_energy, -3.0);
        assert_eq!(out.record.totals.len(), FuelCategory::ALL.len());
    }

    #[test]
    fn test_missing_area_warns_and_skips_eui() {
        let mapping = MappingOutcome {
            mapped: vec![mapped("Heating_Electricity", FuelCategory::Electricity, 1.0, EnergyUnit::Mbtu)],
            ..MappingOutcome::default()
        };
        let out = assemble(mapping, &metadata(None));
        assert!(out.record.eui_kbtu_per_sf.is_empty());
        assert_eq!(out.record.conditioned_area_sf, None);
        assert_eq!(out.warnings[0].code, WarningCode::MissingMetadata);
    }

    #[test]
    fn test_square_metre_area_reported_in_sf() {
        let mapping = MappingOutcome {
            mapped: vec![mapped("Heating_Electricity", FuelCategory::Electricity, 107.639, EnergyUnit::Mbtu)],
            ..MappingOutcome::default()
        };
        let mut meta = metadata(None);
        meta.set_conditioned_area(100.0, AreaUnit::Sm);
        let out = assemble(mapping, &meta);
        let r = &out.record;

        assert!((r.conditioned_area_sf.unwrap() - 1076.39).abs() < 1e-9);
        assert_eq!(r.area_units, AreaUnit::Sf);
        assert_eq!(r.area_units_report, AreaUnit::Sm);
        assert!((r.eui_kbtu_per_sf["Heating_Electricity"] - 100.0).abs() < 1e-9);

        let columns = r.to_columns();
        assert_eq!(columns["area_units"], "sf");
        assert_eq!(columns["area_units_report"], "sm");
    }
}
