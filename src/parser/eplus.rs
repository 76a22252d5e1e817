// ==========================================
// EEU Ingest - EnergyPlus HTML table report
// ==========================================
// Sections: "Building Area" (conditioned area, ft2/m2)
//           "End Uses" (one column per fuel, unit tag in header)
// Field label: "<end use>_<fuel>"
// ==========================================

use crate::domain::{
    AreaUnit, DocumentMetadata, EnergyUnit, ParseWarning, ParsedEnergyReport, ParsedReport,
    RawObservation, ReportType, WarningCode,
};
use crate::config::normalize_label;
use crate::parser::document::LoadedDocument;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::numeric::{check_total, read_number, RowSum};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const END_USES_HEADING: &str = "End Uses";
const BUILDING_AREA_HEADING: &str = "Building Area";
const NET_CONDITIONED_ROW: &str = "Net Conditioned Building Area";
const TOTAL_ROW: &str = "Total End Uses";
const NON_ENERGY_UNITS: [&str; 5] = ["m3", "gal", "l", "ft3", "m3/s"];

/// A table and the closest bold heading before it.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTable {
    pub heading: String,
    pub rows: Vec<Vec<String>>,
}

fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|e| ParseError::layout(format!("selector '{}': {}", css, e)))
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every table in document order, tagged with its heading.
pub fn collect_tables(document: &Html) -> ParseResult<Vec<HtmlTable>> {
    let heading_or_table = selector("b, table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;

    let mut heading = String::new();
    let mut tables = Vec::new();
    for el in document.select(&heading_or_table) {
        match el.value().name() {
            "b" => heading = cell_text(el),
            _ => {
                let rows = el
                    .select(&row_sel)
                    .map(|tr| tr.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
                    .collect();
                tables.push(HtmlTable {
                    heading: heading.clone(),
                    rows,
                });
            }
        }
    }
    Ok(tables)
}

/// Text following `label` up to the end of its line.
fn labelled_line(text: &str, label: &str) -> Option<String> {
    let start = text.find(label)? + label.len();
    let line = text[start..].lines().next().unwrap_or("").trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn fuel_suffix(column: &str) -> &'static str {
    let column = column.trim();
    if column.eq_ignore_ascii_case("Electricity") {
        "Electricity"
    } else if column.eq_ignore_ascii_case("Natural Gas") {
        "NaturalGas"
    } else if column.starts_with("District Heating") || column.starts_with("District Cooling") {
        "DistrictHeating"
    } else {
        "Other"
    }
}

struct EnergyColumn {
    index: usize,
    name: String,
    suffix: &'static str,
}

pub struct EnergyPlusParser;

impl EnergyPlusParser {
    fn read_area(tables: &[HtmlTable], meta: &mut DocumentMetadata, warnings: &mut Vec<ParseWarning>) {
        let Some(table) = tables.iter().find(|t| t.heading == BUILDING_AREA_HEADING) else {
            warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "EnergyPlus: 'Building Area' table not found; conditioned area unknown",
            ));
            return;
        };

        let unit = table
            .rows
            .first()
            .and_then(|header| header.get(1))
            .and_then(|h| normalize_label(h).unit_tag)
            .and_then(|tag| AreaUnit::from_label(&tag))
            .unwrap_or(AreaUnit::Sf);

        let value = table
            .rows
            .iter()
            .find(|r| r.first().map(|c| c.contains(NET_CONDITIONED_ROW)).unwrap_or(false))
            .and_then(|r| r.get(1))
            .and_then(|v| read_number(v, "EnergyPlus Building Area", warnings));

        match value {
            Some(area) if area > 0.0 => meta.set_conditioned_area(area, unit),
            _ => warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "EnergyPlus: net conditioned building area missing",
            )),
        }
    }

    fn energy_columns(header: &[String]) -> ParseResult<(Vec<EnergyColumn>, EnergyUnit)> {
        let mut columns = Vec::new();
        let mut unit: Option<EnergyUnit> = None;

        for (index, raw) in header.iter().enumerate().skip(1) {
            let label = normalize_label(raw);
            let Some(tag) = label.unit_tag else { continue };
            if NON_ENERGY_UNITS.contains(&tag.to_ascii_lowercase().as_str()) {
                continue;
            }
            let column_unit = EnergyUnit::from_label(&tag).ok_or_else(|| ParseError::UnsupportedUnit(tag.clone()))?;
            match unit {
                None => unit = Some(column_unit),
                Some(u) if u != column_unit => {
                    return Err(ParseError::layout(format!(
                        "EnergyPlus: End Uses mixes units {} and {}",
                        u, column_unit
                    )))
                }
                _ => {}
            }
            columns.push(EnergyColumn {
                index,
                suffix: fuel_suffix(&label.key),
                name: label.key,
            });
        }

        let unit = unit.ok_or_else(|| ParseError::layout("EnergyPlus: End Uses has no energy columns"))?;
        Ok((columns, unit))
    }
}

impl ReportParser for EnergyPlusParser {
    fn report_type(&self) -> ReportType {
        ReportType::EnergyPlus
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let html = doc.html()?;
        let document = Html::parse_document(html);
        let tables = collect_tables(&document)?;

        let end_uses = tables
            .iter()
            .find(|t| t.heading == END_USES_HEADING)
            .ok_or_else(|| ParseError::layout("EnergyPlus: 'End Uses' table not found"))?;
        let header = end_uses
            .rows
            .first()
            .ok_or_else(|| ParseError::layout("EnergyPlus: End Uses table is empty"))?;
        let (columns, unit) = Self::energy_columns(header)?;

        let mut warnings = Vec::new();
        let mut meta = DocumentMetadata::new(ReportType::EnergyPlus, unit);

        let all_text = document.root_element().text().collect::<String>();
        meta.project_name = labelled_line(&all_text, "Building:");
        meta.weather_string = labelled_line(&all_text, "Environment:").unwrap_or_default();
        Self::read_area(&tables, &mut meta, &mut warnings);

        let mut observations = Vec::new();
        let mut sums = vec![RowSum::default(); columns.len()];
        let mut published: Vec<Option<RowSum>> = vec![None; columns.len()];

        for row in end_uses.rows.iter().skip(1) {
            let label = row.first().map(|s| s.trim()).unwrap_or("");
            if label.is_empty() {
                continue;
            }
            let is_total = label == TOTAL_ROW;

            for (i, column) in columns.iter().enumerate() {
                let raw = row.get(column.index).map(String::as_str).unwrap_or("");
                let context = format!("EnergyPlus {} / {}", label, column.name);
                let Some(value) = read_number(raw, &context, &mut warnings) else { continue };
                if is_total {
                    published[i].get_or_insert_with(RowSum::default).add(raw, value);
                } else {
                    sums[i].add(raw, value);
                    observations.push(RawObservation::new(
                        format!("{}_{}", label, column.suffix),
                        value,
                        ReportType::EnergyPlus,
                    ));
                }
            }
        }

        for (i, column) in columns.iter().enumerate() {
            if let Some(total) = &published[i] {
                let context = format!("EnergyPlus End Uses {}", column.name);
                if let Some(w) = check_total(&context, &sums[i], total, &ctx.sum_check) {
                    warnings.push(w);
                }
            }
        }

        if observations.is_empty() {
            return Err(ParseError::layout("EnergyPlus: End Uses table has no rows"));
        }

        debug!(observations = observations.len(), unit = %unit, "EnergyPlus parsed");
        Ok(ParsedReport::Energy(ParsedEnergyReport {
            observations,
            metadata: meta,
            warnings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrosswalkConfig;

    pub(crate) const SAMPLE: &str = r#"<html><body>
<p>Program Version:EnergyPlus, Version 9.6</p>
<p>Building: Oak Street Library
</p>
<p>Environment: BOSTON LOGAN INTL ARPT ANN CLG .4% CONDNS DB=>MWB
</p>
<b>Building Area</b><br><br>
<table>
<tr><td></td><td>Area [m2]</td></tr>
<tr><td>Total Building Area</td><td>1200.00</td></tr>
<tr><td>Net Conditioned Building Area</td><td>1000.00</td></tr>
</table>
<b>End Uses</b><br><br>
<table>
<tr><td></td><td>Electricity [GJ]</td><td>Natural Gas [GJ]</td><td>District Cooling [GJ]</td><td>Water [m3]</td></tr>
<tr><td>Heating</td><td>10.00</td><td>50.00</td><td>0.00</td><td>0.00</td></tr>
<tr><td>Cooling</td><td>20.00</td><td>0.00</td><td>5.00</td><td>3.00</td></tr>
<tr><td>Interior Lighting</td><td>30.00</td><td>0.00</td><td>0.00</td><td>0.00</td></tr>
<tr><td>&nbsp;</td><td></td><td></td><td></td><td></td></tr>
<tr><td>Total End Uses</td><td>60.00</td><td>50.00</td><td>5.00</td><td>3.00</td></tr>
</table>
</body></html>"#;

    fn parse(html: &str) -> ParseResult<ParsedEnergyReport> {
        let cw = CrosswalkConfig::bundled().unwrap();
        let ctx = ParseContext::new(&cw);
        let doc = LoadedDocument::from_text(html, "eplus.html");
        match EnergyPlusParser.parse(&doc, &ctx)? {
            ParsedReport::Energy(r) => Ok(r),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_end_uses() {
        let report = parse(SAMPLE).unwrap();
        assert_eq!(report.metadata.energy_units_declared, EnergyUnit::Gj);
        assert_eq!(report.metadata.project_name.as_deref(), Some("Oak Street Library"));
        assert!(report.metadata.weather_string.starts_with("BOSTON LOGAN"));
        assert_eq!(report.metadata.area_units, AreaUnit::Sm);
        assert_eq!(report.metadata.conditioned_area, Some(1000.0));

        let fields: Vec<_> = report.observations.iter().map(|o| o.report_field.as_str()).collect();
        assert!(fields.contains(&"Heating_NaturalGas"));
        assert!(fields.contains(&"Cooling_DistrictHeating"));
        assert!(!fields.iter().any(|f| f.contains("Water")));
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_total_mismatch_warns() {
        let html = SAMPLE.replace("<td>Total End Uses</td><td>60.00</td>", "<td>Total End Uses</td><td>70.00</td>");
        let report = parse(&html).unwrap();
        let mismatches: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::SumMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.contains("(60)"));
        assert!(mismatches[0].message.contains("(70)"));
    }

    #[test]
    fn test_small_column_mismatch_warns() {
        // District Cooling rows sum to 5.00 against a printed 5.45
        let html = SAMPLE.replace(
            "<td>50.00</td><td>5.00</td><td>3.00</td></tr>",
            "<td>50.00</td><td>5.45</td><td>3.00</td></tr>",
        );
        let report = parse(&html).unwrap();
        let mismatches: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::SumMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.contains("(5)"));
        assert!(mismatches[0].message.contains("(5.45)"));
    }

    #[test]
    fn test_missing_end_uses_is_layout_error() {
        let err = parse("<html><body><b>Other</b><table><tr><td>x</td></tr></table></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::LayoutNotRecognized { .. }));
    }

    #[test]
    fn test_unsupported_unit() {
        let html = SAMPLE.replace("Electricity [GJ]", "Electricity [kWh]");
        assert!(matches!(parse(&html).unwrap_err(), ParseError::UnsupportedUnit(_)));
    }
}
