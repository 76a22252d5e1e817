// ==========================================
// EEU Ingest - unit normalizer
// ==========================================
// Canonical energy unit: MBtu
// Display conversions are pure and take the source unit
// explicitly so a value is never converted twice.
// ==========================================

use crate::domain::{EnergyUnit, NormalizedRecord};
use std::collections::BTreeMap;

pub const GJ_TO_MBTU: f64 = 0.947817;
pub const MBTU_TO_GJ: f64 = 1.0550558526;
pub const MBTU_TO_KWH: f64 = 293.071;
pub const MBTU_TO_KBTU: f64 = 1000.0;
pub const MWH_TO_KBTU: f64 = 3414.4259497;
pub const SF_TO_M2: f64 = 0.092903;
pub const KBTU_PER_SF_TO_KWH_PER_M2: f64 = 0.293071 / 0.092903;

/// Converts a value in `from` into MBtu.
pub fn to_mbtu(value: f64, from: EnergyUnit) -> f64 {
    match from {
        EnergyUnit::Mbtu => value,
        EnergyUnit::Gj => gj_to_mbtu(value),
        EnergyUnit::Kbtu => kbtu_to_mbtu(value),
        EnergyUnit::Mwh => kbtu_to_mbtu(mwh_to_kbtu(value)),
    }
}

pub fn gj_to_mbtu(value: f64) -> f64 {
    value * GJ_TO_MBTU
}

pub fn mbtu_to_gj(value: f64) -> f64 {
    value * MBTU_TO_GJ
}

pub fn kbtu_to_mbtu(value: f64) -> f64 {
    value / MBTU_TO_KBTU
}

pub fn mbtu_to_kbtu(value: f64) -> f64 {
    value * MBTU_TO_KBTU
}

pub fn mwh_to_kbtu(value: f64) -> f64 {
    value * MWH_TO_KBTU
}

pub fn mbtu_to_kwh(value: f64) -> f64 {
    value * MBTU_TO_KWH
}

/// kBtu per square foot from an MBtu value and an area in square feet.
pub fn eui_kbtu_per_sf(mbtu: f64, area_sf: f64) -> Option<f64> {
    (area_sf > 0.0).then(|| mbtu * MBTU_TO_KBTU / area_sf)
}

// ==========================================
// Display units
// ==========================================

/// Energy units a record can be presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEnergy {
    Mbtu,
    Kbtu,
    Kwh,
    Gj,
}

impl DisplayEnergy {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayEnergy::Mbtu => "mbtu",
            DisplayEnergy::Kbtu => "kbtu",
            DisplayEnergy::Kwh => "kwh",
            DisplayEnergy::Gj => "gj",
        }
    }

    /// Converts an MBtu value into this unit.
    pub fn from_mbtu(&self, mbtu: f64) -> f64 {
        match self {
            DisplayEnergy::Mbtu => mbtu,
            DisplayEnergy::Kbtu => mbtu_to_kbtu(mbtu),
            DisplayEnergy::Kwh => mbtu_to_kwh(mbtu),
            DisplayEnergy::Gj => mbtu_to_gj(mbtu),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnits {
    /// kBtu, sf, kBtu/sf
    Imperial,
    /// kWh, m2, kWh/m2
    Metric,
}

impl DisplayUnits {
    pub fn energy(&self) -> DisplayEnergy {
        match self {
            DisplayUnits::Imperial => DisplayEnergy::Kbtu,
            DisplayUnits::Metric => DisplayEnergy::Kwh,
        }
    }

    pub fn area_label(&self) -> &'static str {
        match self {
            DisplayUnits::Imperial => "sf",
            DisplayUnits::Metric => "m2",
        }
    }

    pub fn eui_label(&self) -> &'static str {
        match self {
            DisplayUnits::Imperial => "kbtu/sf",
            DisplayUnits::Metric => "kwh/m2",
        }
    }

    pub fn area_from_sf(&self, area_sf: f64) -> f64 {
        match self {
            DisplayUnits::Imperial => area_sf,
            DisplayUnits::Metric => area_sf * SF_TO_M2,
        }
    }

    pub fn eui_from_kbtu_per_sf(&self, eui: f64) -> f64 {
        match self {
            DisplayUnits::Imperial => eui,
            DisplayUnits::Metric => eui * KBTU_PER_SF_TO_KWH_PER_M2,
        }
    }
}

/// A record's numbers in one display system.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayView {
    pub units: DisplayUnits,
    pub fields: BTreeMap<String, f64>,
    pub totals: BTreeMap<String, f64>,
    pub total_energy: f64,
    pub conditioned_area: Option<f64>,
    pub eui: BTreeMap<String, f64>,
}

/// Builds a display view. The record is always in MBtu, so each value is converted exactly once.
pub fn display_view(record: &NormalizedRecord, units: DisplayUnits) -> DisplayView {
    let energy = units.energy();
    DisplayView {
        units,
        fields: record
            .fields
            .iter()
            .map(|(name, v)| (name.clone(), energy.from_mbtu(*v)))
            .collect(),
        totals: record
            .totals
            .iter()
            .map(|(category, v)| (category.total_column(), energy.from_mbtu(*v)))
            .collect(),
        total_energy: energy.from_mbtu(record.total_energy),
        conditioned_area: record.conditioned_area_sf.map(|sf| units.area_from_sf(sf)),
        eui: record
            .eui_kbtu_per_sf
            .iter()
            .map(|(name, v)| (name.clone(), units.eui_from_kbtu_per_sf(*v)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AreaUnit, FuelCategory, ReportType};

    fn close(a: f64, b: f64) -> bool {
        ((a - b) / b).abs() < 1e-6
    }

    #[test]
    fn test_to_mbtu_multipliers() {
        assert_eq!(to_mbtu(5.0, EnergyUnit::Mbtu), 5.0);
        assert!(close(to_mbtu(10.0, EnergyUnit::Gj), 9.47817));
        assert!(close(to_mbtu(2500.0, EnergyUnit::Kbtu), 2.5));
        assert!(close(to_mbtu(1.0, EnergyUnit::Mwh), 3.4144259497));
    }

    #[test]
    fn test_round_trips_within_tolerance() {
        for x in [0.001, 1.0, 42.5, 1.0e6] {
            assert!(close(gj_to_mbtu(mbtu_to_gj(x)), x));
            assert!(close(kbtu_to_mbtu(mbtu_to_kbtu(x)), x));
            assert!(close(kbtu_to_mbtu(mwh_to_kbtu(x)), to_mbtu(x, EnergyUnit::Mwh)));
        }
    }

    #[test]
    fn test_eui_requires_area() {
        assert_eq!(eui_kbtu_per_sf(10.0, 0.0), None);
        assert_eq!(eui_kbtu_per_sf(10.0, 1000.0), Some(10.0));
    }

    #[test]
    fn test_metric_display() {
        let units = DisplayUnits::Metric;
        assert!(close(units.energy().from_mbtu(1.0), 293.071));
        assert!(close(units.area_from_sf(1000.0), 92.903));
        assert!(close(units.eui_from_kbtu_per_sf(1.0), 3.154591));
        assert_eq!(DisplayUnits::Imperial.eui_from_kbtu_per_sf(7.0), 7.0);
    }

    fn record() -> NormalizedRecord {
        let mut totals: BTreeMap<FuelCategory, f64> = FuelCategory::ALL.iter().map(|c| (*c, 0.0)).collect();
        totals.insert(FuelCategory::Electricity, 10.0);
        NormalizedRecord {
            fields: BTreeMap::from([("Heating_Electricity".to_string(), 10.0)]),
            totals,
            total_energy: 10.0,
            net_energy: 10.0,
            conditioned_area_sf: Some(1000.0),
            area_units: AreaUnit::Sf,
            area_units_report: AreaUnit::Sf,
            energy_units: EnergyUnit::Mbtu,
            weather_string: "02116".to_string(),
            report_type: ReportType::GenericXlsx,
            project_name: None,
            use_type_total_area: Some(1000.0),
            eui_kbtu_per_sf: BTreeMap::from([
                ("Heating_Electricity".to_string(), 10.0),
                ("total_energy".to_string(), 10.0),
            ]),
            reported_values: Vec::new(),
            unmapped_fields: Vec::new(),
        }
    }

    #[test]
    fn test_display_view_metric() {
        let view = display_view(&record(), DisplayUnits::Metric);
        let electricity = FuelCategory::Electricity.total_column();

        assert_eq!(view.units, DisplayUnits::Metric);
        assert!(close(view.fields["Heating_Electricity"], 2930.71));
        assert!(close(view.totals[&electricity], 2930.71));
        assert_eq!(view.totals[&FuelCategory::FossilFuels.total_column()], 0.0);
        assert_eq!(view.totals.len(), FuelCategory::ALL.len());
        assert!(close(view.total_energy, 2930.71));
        assert!(close(view.conditioned_area.unwrap(), 92.903));
        assert!(close(view.eui["total_energy"], 31.545913));
        assert!(close(view.eui["Heating_Electricity"], 31.545913));
    }

    #[test]
    fn test_display_view_imperial_without_area() {
        let mut record = record();
        record.conditioned_area_sf = None;
        record.eui_kbtu_per_sf.clear();
        let view = display_view(&record, DisplayUnits::Imperial);

        assert!(close(view.total_energy, 10_000.0));
        assert!(close(view.fields["Heating_Electricity"], 10_000.0));
        assert_eq!(view.conditioned_area, None);
        assert!(view.eui.is_empty());
    }
}
