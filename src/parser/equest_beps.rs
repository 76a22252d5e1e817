// ==========================================
// EEU Ingest - eQuest BEPS report (PDF)
// ==========================================
// Page: "REPORT- BEPS Building Energy Performance"
// Table: two-line header over a dashed column rule,
//        "<code> <meter>" lines each followed by an MBTU row,
//        published total row below the "=====" rule
// Field label: "<column>_<energy type>"
// Area: TOTAL SITE ENERGY <MBTU> MBTU <kBtu/sf> KBTU
// ==========================================

use crate::domain::{
    DocumentMetadata, EnergyUnit, AreaUnit, ParseWarning, ParsedEnergyReport, ParsedReport,
    RawObservation, ReportType, WarningCode,
};
use crate::parser::document::LoadedDocument;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::layout::{Anchor, Extracted, Extraction, PageSelector, RegionEnd, RegionSpec, RegionStart};
use crate::parser::numeric::{check_total, parse_number, read_number, CellNumber, RowSum};
use crate::parser::report_parser_trait::{ParseContext, ReportParser};
use crate::parser::text_table::{is_rule_line, rekey_continuation, split_cells, split_tokens};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub const BEPS_TITLE: &str = "REPORT- BEPS Building Energy Performance";
const UNIT_ROW: &str = "MBTU";
const TOTAL_COLUMN: &str = "TOTAL";

const BEPS_TABLE: RegionSpec = RegionSpec {
    name: "BEPS table",
    page: PageSelector::FirstContaining(&[Anchor::Literal(BEPS_TITLE)]),
    start: Anchor::Literal(BEPS_TITLE),
    start_at: RegionStart::AfterAnchorLine,
    end: RegionEnd::FirstOf(&[
        Anchor::Literal("TOTAL SITE ENERGY"),
        Anchor::Literal("NET ENERGY FROM SOURCES"),
    ]),
    strategy: Extraction::RuledTable,
};

static SITE_ENERGY: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"TOTAL SITE ENERGY\s+([\d,.]+)\s+MBTU\s+([\d,.]+)\s+KBTU"));

/// Conditioned area in sf implied by site energy and site EUI.
fn area_from_site_energy(text: &str) -> ParseResult<Option<f64>> {
    let re = SITE_ENERGY
        .as_ref()
        .map_err(|e| ParseError::layout(format!("site energy pattern: {}", e)))?;
    let Some(caps) = re.captures(text) else { return Ok(None) };

    let number = |i: usize| match caps.get(i).map(|m| parse_number(m.as_str())) {
        Some(CellNumber::Value(v)) => Some(v),
        _ => None,
    };
    Ok(match (number(1), number(2)) {
        (Some(mbtu), Some(kbtu_per_sf)) if kbtu_per_sf > 0.0 => Some((mbtu / (kbtu_per_sf / 1000.0)).round()),
        _ => None,
    })
}

fn weather_file(pages: &[String]) -> Option<String> {
    const LABEL: &str = "WEATHER FILE-";
    pages.iter().find_map(|page| {
        let start = page.find(LABEL)? + LABEL.len();
        let line = page[start..].lines().next()?.trim();
        (!line.is_empty()).then(|| line.to_string())
    })
}

/// Project name from the DOE-2 page banner, when present.
fn project_name(page: &str) -> Option<String> {
    let banner = page.lines().find(|l| !l.trim().is_empty())?;
    if !banner.contains("DOE-2") {
        return None;
    }
    split_cells(banner)
        .into_iter()
        .next()
        .map(|c| c.text)
        .filter(|name| !name.starts_with("DOE-2"))
}

/// Reads the BEPS table from page text; shared by the PDF and SIM formats.
pub(crate) fn parse_beps_pages(
    pages: &[String],
    report_type: ReportType,
    ctx: &ParseContext<'_>,
) -> ParseResult<ParsedEnergyReport> {
    let region = BEPS_TABLE.locate(pages)?;
    let Extracted::Table { table, body } = region.extract()? else {
        return Err(ParseError::layout("BEPS: table expected"));
    };
    let total_idx = table
        .columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(TOTAL_COLUMN));

    let mut meter: Option<String> = None;
    let mut after_rule = false;
    let mut meter_rows: Vec<(String, Vec<Option<String>>)> = Vec::new();
    let mut total_row: Option<Vec<Option<String>>> = None;

    for line in &body {
        if line.trim().is_empty() {
            continue;
        }
        if is_rule_line(line, '=') {
            after_rule = true;
            continue;
        }
        let tokens = split_tokens(line);
        let is_unit_row = tokens
            .first()
            .map(|t| t.text.eq_ignore_ascii_case(UNIT_ROW))
            .unwrap_or(false);

        if is_unit_row {
            let cells = table.assign(&tokens[1..]);
            if after_rule {
                total_row = Some(cells);
                break;
            }
            meter_rows.push((rekey_continuation(UNIT_ROW, meter.as_deref(), &[UNIT_ROW]), cells));
        } else if !tokens.iter().any(|t| matches!(parse_number(&t.text), CellNumber::Value(_))) {
            meter = Some(tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "));
        }
    }

    if meter_rows.is_empty() {
        return Err(ParseError::layout("BEPS: no meter rows found"));
    }

    let mut warnings = Vec::new();
    let mut observations = Vec::new();
    let mut total_column_sum = RowSum::default();

    for (label, cells) in &meter_rows {
        let code = label.split_whitespace().next().unwrap_or(UNIT_ROW);
        let energy_type = match ctx.crosswalk.energy_type_for_code(code) {
            Some(t) => t.to_string(),
            None => {
                warn!(code, "unknown eQuest meter code");
                warnings.push(ParseWarning::new(
                    WarningCode::UnknownEnergyCode,
                    format!("Did not find energy code for {}", code),
                ));
                code.to_ascii_lowercase()
            }
        };

        for (i, column) in table.columns.iter().enumerate() {
            let raw = cells[i].as_deref().unwrap_or("");
            let context = format!("BEPS {} / {}", label, column.name);
            let Some(value) = read_number(raw, &context, &mut warnings) else { continue };
            if Some(i) == total_idx {
                total_column_sum.add(raw, value);
            } else {
                observations.push(RawObservation::new(
                    format!("{}_{}", column.name, energy_type),
                    value,
                    report_type,
                ));
            }
        }
    }

    if let (Some(idx), Some(total_cells)) = (total_idx, &total_row) {
        let raw = total_cells[idx].as_deref().unwrap_or("");
        if let Some(published) = read_number(raw, "BEPS total row", &mut warnings) {
            if let Some(w) = check_total("BEPS", &total_column_sum, &RowSum::of(raw, published), &ctx.sum_check) {
                warnings.push(w);
            }
        }
    }

    let page = &pages[region.page_index];
    let mut meta = DocumentMetadata::new(report_type, EnergyUnit::Mbtu);
    meta.project_name = project_name(page);
    meta.weather_string = weather_file(pages).unwrap_or_default();
    match area_from_site_energy(&pages.join("\n"))? {
        Some(area) => meta.set_conditioned_area(area, AreaUnit::Sf),
        None => warnings.push(ParseWarning::new(
            WarningCode::MissingMetadata,
            "BEPS: TOTAL SITE ENERGY line not found; conditioned area unknown",
        )),
    }

    debug!(
        report_type = %report_type,
        meters = meter_rows.len(),
        observations = observations.len(),
        "BEPS table parsed"
    );
    Ok(ParsedEnergyReport {
        observations,
        metadata: meta,
        warnings,
    })
}

pub struct EquestBepsParser;

impl ReportParser for EquestBepsParser {
    fn report_type(&self) -> ReportType {
        ReportType::EquestBeps
    }

    fn parse(&self, doc: &LoadedDocument, ctx: &ParseContext<'_>) -> ParseResult<ParsedReport> {
        let pages = doc.pdf_pages()?;
        if !pages.iter().any(|p| p.contains(BEPS_TITLE)) {
            return Err(ParseError::layout("BEPS: report title not found"));
        }
        parse_beps_pages(pages, ReportType::EquestBeps, ctx).map(ParsedReport::Energy)
    }
}
