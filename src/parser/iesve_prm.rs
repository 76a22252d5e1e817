// ==========================================
// EEU Ingest - IES-VE PRM compliance report (PDF)
// ==========================================
// Pages used:
//   "Space Summary" + "Building Use" -> "Totals" row (area)
//   "Weather file" ... "zone:"        -> weather string
//   "Performance Rating Table - PRM Compliance" -> rows
//     below the "%" header; continues onto the next page
//     unless that page starts the next section
// Row: <end use> <energy type> "Energy use kBtu" <design> <%> <baseline> <%>
// ==========================================

use crate::domain::{
    AreaUnit, BaselineDesign, DocumentMetadata, EnergyUnit, ParseWarning, ParsedEnergyReport,
    ParsedReport, RawObservation, ReportType, WarningCode,
};
use crate::parser::document::LoadedDocument;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::layout::{Anchor, Extracted, Extraction, PageSelector, RegionEnd, RegionSpec, RegionStart};
use crate::parser::numeric::{leading_number, read_number};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use crate::parser::text_table::split_cells;
use tracing::debug;

pub const PRM_TITLE: &str = "Performance Rating Table - PRM Compliance";
const NEXT_SECTION: &str = "Energy Cost & Consumption by energy Type";
const WEATHER_LABEL: &str = "Weather file";
const ENERGY_ROW: &str = "energy use";

const AREA_TOTALS: RegionSpec = RegionSpec {
    name: "PRM space summary totals",
    page: PageSelector::FirstContaining(&[Anchor::Literal("Space Summary"), Anchor::Literal("Building Use")]),
    start: Anchor::Literal("Totals"),
    start_at: RegionStart::AnchorLine,
    end: RegionEnd::BlankLine,
    strategy: Extraction::Lines,
};

const PRM_TABLE: RegionSpec = RegionSpec {
    name: "PRM compliance table",
    page: PageSelector::FirstContaining(&[Anchor::Literal(PRM_TITLE)]),
    start: Anchor::Literal("%"),
    start_at: RegionStart::AfterAnchorLine,
    end: RegionEnd::EndOfPage,
    strategy: Extraction::Lines,
};

fn region_lines(spec: &RegionSpec, pages: &[String], page_index: Option<usize>) -> ParseResult<(usize, Vec<String>)> {
    let region = match page_index {
        Some(i) => spec.locate_on(pages, i)?,
        None => spec.locate(pages)?,
    };
    match region.extract()? {
        Extracted::Lines(lines) => Ok((region.page_index, lines)),
        _ => Err(ParseError::layout(format!("{}: lines expected", spec.name))),
    }
}

fn conditioned_area(pages: &[String]) -> Option<f64> {
    let (_, lines) = region_lines(&AREA_TOTALS, pages, None).ok()?;
    let totals = lines.first()?;
    let after = totals.trim_start().strip_prefix("Totals")?;
    leading_number(after).filter(|v| *v > 0.0)
}

/// Text between "Weather file" and the "Climate zone:" label.
fn weather_string(pages: &[String]) -> Option<String> {
    let page = pages.iter().find(|p| p.contains(WEATHER_LABEL))?;
    let start = page.find(WEATHER_LABEL)? + WEATHER_LABEL.len();
    let rest = &page[start..];
    let end = rest.to_ascii_lowercase().find("zone:").unwrap_or(rest.len());
    let text = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text.trim_end_matches("Climate").trim().trim_start_matches(':').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// One "Energy use" row with end use and energy type carried from earlier rows.
#[derive(Debug, Clone, PartialEq)]
struct PrmRow {
    end_use: String,
    energy_type: String,
    unit: String,
    design: String,
    baseline: String,
}

#[derive(Default)]
struct RowReader {
    end_use: Option<String>,
    energy_type: Option<String>,
}

impl RowReader {
    fn read(&mut self, line: &str) -> Option<PrmRow> {
        let cells: Vec<String> = split_cells(line).into_iter().map(|c| c.text).collect();
        let type_idx = cells
            .iter()
            .position(|c| c.to_ascii_lowercase().starts_with(ENERGY_ROW))?;

        match &cells[..type_idx] {
            [] => {}
            [energy_type] => self.energy_type = Some(energy_type.clone()),
            [end_use, energy_type, ..] => {
                self.end_use = Some(end_use.clone());
                self.energy_type = Some(energy_type.clone());
            }
        }

        // "Energy use kBtu" may print as one cell or two
        let mut unit = cells[type_idx][ENERGY_ROW.len()..].trim().to_string();
        let mut values = &cells[type_idx + 1..];
        if unit.is_empty() {
            if let Some((first, rest)) = values.split_first() {
                if first.chars().any(|c| c.is_ascii_alphabetic()) {
                    unit = first.clone();
                    values = rest;
                }
            }
        }

        Some(PrmRow {
            end_use: self.end_use.clone()?,
            energy_type: self.energy_type.clone()?,
            unit,
            design: values.first().cloned().unwrap_or_default(),
            baseline: values.get(2).cloned().unwrap_or_default(),
        })
    }
}

fn fuel_for(energy_type: &str) -> &'static str {
    if energy_type.contains("Gas") {
        "gas"
    } else {
        "electricity"
    }
}

pub struct IesvePrmParser;

impl ReportParser for IesvePrmParser {
    fn report_type(&self) -> ReportType {
        ReportType::IesvePrm
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let pages = doc.pdf_pages()?;
        let (page_index, mut lines) = region_lines(&PRM_TABLE, pages, None)?;

        let continues = pages
            .get(page_index + 1)
            .map(|next| !next.contains(NEXT_SECTION))
            .unwrap_or(false);
        if continues {
            let (_, more) = region_lines(&PRM_TABLE, pages, Some(page_index + 1))?;
            lines.extend(more);
        }

        let mut warnings: Vec<ParseWarning> = Vec::new();
        let mut observations = Vec::new();
        let mut reader = RowReader::default();

        for line in &lines {
            let Some(row) = reader.read(line) else { continue };
            let end_use = row.end_use.split_whitespace().collect::<Vec<_>>().join(" ");
            if end_use.to_ascii_lowercase().starts_with("total") {
                continue;
            }
            if !row.unit.eq_ignore_ascii_case("kBtu") {
                warnings.push(ParseWarning::new(
                    WarningCode::UnitMismatch,
                    format!("PRM {}: energy use in '{}' skipped, kBtu expected", end_use, row.unit),
                ));
                continue;
            }

            let raw = match ctx.baseline_design {
                BaselineDesign::Design => &row.design,
                BaselineDesign::Baseline => &row.baseline,
            };
            let context = format!("PRM {} ({})", end_use, ctx.baseline_design);
            let Some(value) = read_number(raw, &context, &mut warnings) else { continue };
            observations.push(RawObservation::new(
                format!("{}_{}", end_use, fuel_for(&row.energy_type)),
                value,
                ReportType::IesvePrm,
            ));
        }

        if observations.is_empty() {
            return Err(ParseError::layout("PRM: no energy use rows found"));
        }

        let mut meta = DocumentMetadata::new(ReportType::IesvePrm, EnergyUnit::Kbtu);
        match conditioned_area(pages) {
            Some(area) => meta.set_conditioned_area(area, AreaUnit::Sf),
            None => warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "PRM: space summary 'Totals' row not found; conditioned area unknown",
            )),
        }
        meta.weather_string = weather_string(pages).unwrap_or_default();

        debug!(
            observations = observations.len(),
            two_page = continues,
            baseline_design = %ctx.baseline_design,
            "IES-VE PRM parsed"
        );
        Ok(ParsedReport::Energy(ParsedEnergyReport {
            observations,
            metadata: meta,
            warnings,
        }))
    }
}
