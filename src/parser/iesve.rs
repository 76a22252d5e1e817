// ==========================================
// EEU Ingest - IES-VE summary report (PDF)
// ==========================================
// First page only:
//   header block: Project / Weather / Conditioned Area
//   "Energy End Use" table, Site Energy column in kBtu/ft2
// Energy value = site EUI x area / 1000 (MBtu)
// ==========================================

use crate::domain::{
    AreaUnit, DocumentMetadata, EnergyUnit, ParseWarning, ParsedEnergyReport, ParsedReport,
    RawObservation, ReportType, SF_PER_SM,
};
use crate::parser::document::LoadedDocument;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::layout::{find_value, Anchor, Extracted, Extraction, PageSelector, RegionEnd, RegionSpec, RegionStart};
use crate::parser::numeric::{check_total, leading_number, read_number, RowSum};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use crate::parser::text_table::split_cells;
use tracing::debug;

const TABLE_TITLE: &str = "Energy End Use";
const SITE_COLUMN: &str = "Site Energy";

const HEADER_BLOCK: RegionSpec = RegionSpec {
    name: "IES-VE project block",
    page: PageSelector::First,
    start: Anchor::Insensitive("project"),
    start_at: RegionStart::AnchorLine,
    end: RegionEnd::Anchor(Anchor::Literal(TABLE_TITLE)),
    strategy: Extraction::KeyValue,
};

const END_USE_TABLE: RegionSpec = RegionSpec {
    name: "IES-VE energy end use table",
    page: PageSelector::First,
    start: Anchor::Literal(TABLE_TITLE),
    start_at: RegionStart::AnchorLine,
    end: RegionEnd::EndOfPage,
    strategy: Extraction::WhitespaceTable { header_lines: 2 },
};

/// Area in sf and the unit it was printed in.
fn conditioned_area(pairs: &[(String, String)]) -> Option<(f64, AreaUnit)> {
    let raw = find_value(pairs, "conditioned area").or_else(|| find_value(pairs, "floor area"))?;
    let value = leading_number(raw).filter(|v| *v > 0.0)?;
    let lower = raw.to_ascii_lowercase();
    if lower.contains("m2") || lower.contains("m²") {
        Some((value * SF_PER_SM, AreaUnit::Sm))
    } else {
        Some((value, AreaUnit::Sf))
    }
}

pub struct IesveParser;

impl ReportParser for IesveParser {
    fn report_type(&self) -> ReportType {
        ReportType::Iesve
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let pages = doc.pdf_pages()?;
        if !pages.first().map(|p| p.contains(SITE_COLUMN)).unwrap_or(false) {
            return Err(ParseError::layout("IES-VE: 'Site Energy' column not on first page"));
        }

        let Extracted::KeyValue(pairs) = HEADER_BLOCK.locate(pages)?.extract()? else {
            return Err(ParseError::layout("IES-VE: project block expected"));
        };
        let (area_sf, area_unit) = conditioned_area(&pairs)
            .ok_or_else(|| ParseError::layout("IES-VE: conditioned area not found"))?;

        let Extracted::Table { table, body } = END_USE_TABLE.locate(pages)?.extract()? else {
            return Err(ParseError::layout("IES-VE: end use table expected"));
        };
        let site_idx = table
            .column_index(SITE_COLUMN)
            .ok_or_else(|| ParseError::layout("IES-VE: 'Site Energy' column not found"))?;

        let mut warnings: Vec<ParseWarning> = Vec::new();
        let mut observations = Vec::new();
        let mut eui_sum = RowSum::default();

        for line in &body {
            let cells = table.assign(&split_cells(line));
            let label = cells[0].as_deref().unwrap_or("").trim().to_string();
            if label.is_empty() {
                continue;
            }
            let raw = cells[site_idx].as_deref().unwrap_or("");
            let Some(eui) = read_number(raw, &format!("IES-VE {}", label), &mut warnings) else { continue };

            if label.eq_ignore_ascii_case("Total") {
                if let Some(w) = check_total("IES-VE site energy", &eui_sum, &RowSum::of(raw, eui), &ctx.sum_check) {
                    warnings.push(w);
                }
                break;
            }
            eui_sum.add(raw, eui);
            observations.push(RawObservation::new(label, eui * area_sf / 1000.0, ReportType::Iesve));
        }

        if observations.is_empty() {
            return Err(ParseError::layout("IES-VE: end use table has no rows"));
        }

        let mut meta = DocumentMetadata::new(ReportType::Iesve, EnergyUnit::Mbtu);
        let printed_area = match area_unit {
            AreaUnit::Sm => area_sf / SF_PER_SM,
            AreaUnit::Sf => area_sf,
        };
        meta.set_conditioned_area(printed_area, area_unit);
        meta.project_name = find_value(&pairs, "project").map(str::to_string);
        meta.weather_string = find_value(&pairs, "weather").unwrap_or_default().to_string();

        debug!(observations = observations.len(), area_sf, "IES-VE parsed");
        Ok(ParsedReport::Energy(ParsedEnergyReport {
            observations,
            metadata: meta,
            warnings,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::CrosswalkConfig;
    use crate::domain::WarningCode;

    pub(crate) fn iesve_page(total: &str) -> String {
        [
            "IES Virtual Environment - Energy Summary",
            "Project:            Oak Street School",
            "Weather:            BOSTON LOGAN INTL ARPT",
            "Conditioned Area:   20,000 ft2",
            "",
            "Energy End Use               Site Energy     Source Energy   CO2 Em",
            "                             kBtu/ft2        kBtu/ft2        kgCO2/ft2",
            "Heating (Natural Gas)        10.0            11.0            0.50",
            "Cooling (Electricity)        5.0             15.0            0.90",
            "Interior Lighting            4.0             12.0            0.70",
            "Equipment                    6.0             18.0            1.00",
            &format!("Total                        {}            56.0            3.10", total),
        ]
        .join("\n")
    }

    fn parse(page: String) -> ParseResult<ParsedEnergyReport> {
        let cw = CrosswalkConfig::bundled().unwrap();
        let ctx = ParseContext::new(&cw);
        let doc = LoadedDocument::from_pdf_pages(vec![page], "iesve.pdf");
        match IesveParser.parse(&doc, &ctx)? {
            ParsedReport::Energy(r) => Ok(r),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_energy_from_site_eui() {
        let report = parse(iesve_page("25.0")).unwrap();
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.metadata.project_name.as_deref(), Some("Oak Street School"));
        assert_eq!(report.metadata.weather_string, "BOSTON LOGAN INTL ARPT");
        assert_eq!(report.metadata.conditioned_area, Some(20000.0));

        let heating = &report.observations[0];
        assert_eq!(heating.report_field, "Heating (Natural Gas)");
        assert!((heating.energy_value - 200.0).abs() < 1e-9);
        assert_eq!(report.observations.len(), 4);
    }

    #[test]
    fn test_total_mismatch_is_warning() {
        let report = parse(iesve_page("30.0")).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, WarningCode::SumMismatch);
    }

    #[test]
    fn test_missing_area_is_layout_error() {
        let page = iesve_page("25.0").replace("Conditioned Area:   20,000 ft2", "Building Type:  School");
        assert!(matches!(parse(page).unwrap_err(), ParseError::LayoutNotRecognized { .. }));
    }
}
