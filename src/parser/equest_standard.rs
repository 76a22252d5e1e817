// ==========================================
// EEU Ingest - eQuest standard report (PDF)
// ==========================================
// Monthly tables, value = Total column:
//   "Electric Consumption (kWh x000)"  -> MWh, label suffix _elec
//   "Gas Consumption (Btu x000,000)"   -> MBtu, label suffix _gas
// Each section ends at its "Total" row. Area and location
// are not printed; they come with the upload.
// ==========================================

use crate::domain::{
    AreaUnit, DocumentMetadata, EnergyUnit, ParseWarning, ParsedEnergyReport, ParsedReport,
    RawObservation, ReportType, WarningCode,
};
use crate::parser::document::LoadedDocument;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::layout::{Anchor, Extracted, Extraction, PageSelector, RegionEnd, RegionSpec, RegionStart};
use crate::parser::numeric::{check_total, is_numeric_token, read_number, RowSum};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use crate::parser::text_table::split_tokens;
use tracing::debug;

pub const ELECTRIC_TITLE: &str = "Electric Consumption (kWh x000)";
pub const GAS_TITLE: &str = "Gas Consumption (Btu x000,000)";

const ELECTRIC_SECTION: RegionSpec = RegionSpec {
    name: "electric consumption",
    page: PageSelector::FirstContaining(&[Anchor::Literal(ELECTRIC_TITLE)]),
    start: Anchor::Literal(ELECTRIC_TITLE),
    start_at: RegionStart::AfterAnchorLine,
    end: RegionEnd::EndOfPage,
    strategy: Extraction::Lines,
};

const GAS_SECTION: RegionSpec = RegionSpec {
    name: "gas consumption",
    page: PageSelector::FirstContaining(&[Anchor::Literal(GAS_TITLE)]),
    start: Anchor::Literal(GAS_TITLE),
    start_at: RegionStart::AfterAnchorLine,
    end: RegionEnd::EndOfPage,
    strategy: Extraction::Lines,
};

/// A monthly row: label and its Total-column cell.
struct MonthlyRow {
    label: String,
    total: String,
}

fn monthly_row(line: &str) -> Option<MonthlyRow> {
    let tokens = split_tokens(line);
    let first_value = tokens
        .iter()
        .rposition(|t| !is_numeric_token(&t.text))
        .map(|i| i + 1)
        .unwrap_or(0);
    let values = &tokens[first_value..];
    if first_value == 0 || values.len() < 2 {
        return None;
    }
    let label = tokens[..first_value]
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(MonthlyRow {
        label,
        total: values[values.len() - 1].text.clone(),
    })
}

struct Section {
    suffix: &'static str,
    unit: EnergyUnit,
    context: &'static str,
}

fn read_section(
    lines: &[String],
    section: &Section,
    ctx: &ParseContext<'_>,
    observations: &mut Vec<RawObservation>,
    warnings: &mut Vec<ParseWarning>,
) -> usize {
    let mut sum = RowSum::default();
    let mut count = 0;
    for line in lines {
        let Some(row) = monthly_row(line) else { continue };
        let context = format!("{} {}", section.context, row.label);
        let value = read_number(&row.total, &context, warnings);

        if row.label.eq_ignore_ascii_case("Total") {
            if let Some(published) = value {
                if let Some(w) = check_total(section.context, &sum, &RowSum::of(&row.total, published), &ctx.sum_check) {
                    warnings.push(w);
                }
            }
            break;
        }
        if let Some(v) = value {
            sum.add(&row.total, v);
            count += 1;
            observations.push(
                RawObservation::new(format!("{}_{}", row.label, section.suffix), v, ReportType::EquestStandard)
                    .with_unit(section.unit),
            );
        }
    }
    count
}

fn section_lines(spec: &RegionSpec, pages: &[String]) -> ParseResult<Vec<String>> {
    match spec.locate(pages)?.extract()? {
        Extracted::Lines(lines) => Ok(lines),
        _ => Err(ParseError::layout(format!("{}: lines expected", spec.name))),
    }
}

pub struct EquestStandardParser;

impl ReportParser for EquestStandardParser {
    fn report_type(&self) -> ReportType {
        ReportType::EquestStandard
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let pages = doc.pdf_pages()?;
        let electric = section_lines(&ELECTRIC_SECTION, pages)?;

        let mut observations = Vec::new();
        let mut warnings = Vec::new();
        let elec = Section {
            suffix: "elec",
            unit: EnergyUnit::Mwh,
            context: "eQuest electric consumption",
        };
        if read_section(&electric, &elec, ctx, &mut observations, &mut warnings) == 0 {
            return Err(ParseError::layout("eQuest standard: electric consumption table has no rows"));
        }

        // all-electric buildings print no gas table
        if pages.iter().any(|p| p.contains(GAS_TITLE)) {
            let gas_lines = section_lines(&GAS_SECTION, pages)?;
            let gas = Section {
                suffix: "gas",
                unit: EnergyUnit::Mbtu,
                context: "eQuest gas consumption",
            };
            read_section(&gas_lines, &gas, ctx, &mut observations, &mut warnings);
        }

        let mut meta = DocumentMetadata::new(ReportType::EquestStandard, EnergyUnit::Mbtu);
        match ctx.conditioned_area {
            Some(area) if area > 0.0 => meta.set_conditioned_area(area, AreaUnit::Sf),
            _ => warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "eQuest standard: report has no area and none was supplied with the upload",
            )),
        }
        match ctx.zip_code.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
            Some(zip) => meta.weather_string = zip.to_string(),
            None => warnings.push(ParseWarning::new(
                WarningCode::MissingMetadata,
                "eQuest standard: no zip code supplied for the weather lookup",
            )),
        }

        debug!(observations = observations.len(), "eQuest standard parsed");
        Ok(ParsedReport::Energy(ParsedEnergyReport {
            observations,
            metadata: meta,
            warnings,
        }))
    }
}
