// ==========================================
// EEU Ingest - numeric cells and the total-row check
// ==========================================

use crate::config::SumCheckTolerance;
use crate::domain::{ParseWarning, WarningCode};
use tracing::warn;

/// A table cell read as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum CellNumber {
    Value(f64),
    /// Empty or a placeholder dash.
    Blank,
    /// Text that is not a number; the raw text is kept for the warning.
    Invalid(String),
}

/// Reads a printed number: thousands separators stripped, `-` means blank.
pub fn parse_number(raw: &str) -> CellNumber {
    let trimmed = raw.trim();
    if trimmed.is_empty() || matches!(trimmed, "-" | "--" | "—" | "–" | "n/a" | "N/A") {
        return CellNumber::Blank;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => CellNumber::Value(v),
        _ => CellNumber::Invalid(trimmed.to_string()),
    }
}

/// True when the text reads as a number or a blank placeholder.
pub fn is_numeric_token(raw: &str) -> bool {
    !matches!(parse_number(raw), CellNumber::Invalid(_))
}

/// Number or `None`; invalid text adds a `NonNumericCell` warning and is treated as absent.
pub fn read_number(raw: &str, context: &str, warnings: &mut Vec<ParseWarning>) -> Option<f64> {
    match parse_number(raw) {
        CellNumber::Value(v) => Some(v),
        CellNumber::Blank => None,
        CellNumber::Invalid(text) => {
            warnings.push(ParseWarning::new(
                WarningCode::NonNumericCell,
                format!("{}: non-numeric value '{}' ignored", context, text),
            ));
            None
        }
    }
}

/// First number embedded in free text, e.g. `52,000 ft2` -> 52000.
pub fn leading_number(text: &str) -> Option<f64> {
    text.split_whitespace().find_map(|tok| match parse_number(tok) {
        CellNumber::Value(v) => Some(v),
        _ => None,
    })
}

/// Prints a figure with at most three decimals and no trailing zeros.
pub fn format_figure(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Decimal places a figure was printed with (`12.50` -> 2, `1,200` -> 0).
pub fn printed_decimals(raw: &str) -> u32 {
    let trimmed = raw.trim();
    match trimmed.rfind('.') {
        Some(dot) => trimmed[dot + 1..].chars().take_while(|c| c.is_ascii_digit()).count() as u32,
        None => 0,
    }
}

/// Running sum of printed figures and the rounding they can carry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowSum {
    pub sum: f64,
    pub rows: usize,
    /// Half a unit in the last printed place, summed over every figure.
    pub rounding: f64,
}

impl RowSum {
    pub fn add(&mut self, raw: &str, value: f64) {
        self.sum += value;
        self.rows += 1;
        self.rounding += 0.5 * 10f64.powi(-(printed_decimals(raw) as i32));
    }

    /// Sum of one printed figure.
    pub fn of(raw: &str, value: f64) -> Self {
        let mut s = Self::default();
        s.add(raw, value);
        s
    }
}

/// Compares extracted rows with the total the document printed.
///
/// Only a gap larger than the print rounding of the figures involved is accepted.
/// A mismatch is a `SumMismatch` warning carrying both figures, never an error.
pub fn check_total(
    context: &str,
    rows: &RowSum,
    published: &RowSum,
    tolerance: &SumCheckTolerance,
) -> Option<ParseWarning> {
    if tolerance.accepts(rows.sum, published.sum, rows.rounding + published.rounding) {
        return None;
    }
    warn!(context, rows_sum = rows.sum, published = published.sum, "total row mismatch");
    Some(ParseWarning::new(
        WarningCode::SumMismatch,
        format!(
            "{}: The sum of the rows ({}) does not match the total row's value ({})",
            context,
            format_figure(rows.sum),
            format_figure(published.sum)
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("1,234.5"), CellNumber::Value(1234.5));
        assert_eq!(parse_number(" - "), CellNumber::Blank);
        assert_eq!(parse_number(""), CellNumber::Blank);
        assert_eq!(parse_number("abc"), CellNumber::Invalid("abc".to_string()));
    }

    #[test]
    fn test_read_number_warns_on_text() {
        let mut warnings = Vec::new();
        assert_eq!(read_number("n.a.", "Fans", &mut warnings), None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::NonNumericCell);
        assert_eq!(read_number("-", "Fans", &mut warnings), None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_format_figure() {
        assert_eq!(format_figure(100.0), "100");
        assert_eq!(format_figure(0.1 + 0.2), "0.3");
        assert_eq!(format_figure(95.25), "95.25");
    }

    fn sum_of(cells: &[&str]) -> RowSum {
        let mut sum = RowSum::default();
        for raw in cells {
            if let CellNumber::Value(v) = parse_number(raw) {
                sum.add(raw, v);
            }
        }
        sum
    }

    #[test]
    fn test_printed_decimals() {
        assert_eq!(printed_decimals("12.50"), 2);
        assert_eq!(printed_decimals("1,200"), 0);
        assert_eq!(printed_decimals(" 0.125 "), 3);
    }

    #[test]
    fn test_check_total() {
        let tol = SumCheckTolerance::default();
        // rounded rows: 33.3 * 3 printed as 100.0
        assert!(check_total("t", &sum_of(&["33.3", "33.3", "33.3"]), &RowSum::of("100.0", 100.0), &tol).is_none());
        assert!(check_total("t", &sum_of(&["12.00", "36.00"]), &RowSum::of("48.00", 48.0), &tol).is_none());

        let w = check_total("t", &sum_of(&["90"]), &RowSum::of("100", 100.0), &tol).unwrap();
        assert!(w.message.contains("(90)"));
        assert!(w.message.contains("(100)"));
    }

    #[test]
    fn test_small_total_mismatch_warns() {
        let tol = SumCheckTolerance::default();
        let w = check_total("t", &sum_of(&["2.00", "3.00"]), &RowSum::of("5.45", 5.45), &tol).unwrap();
        assert_eq!(w.code, WarningCode::SumMismatch);
        assert!(w.message.contains("(5)"));
        assert!(w.message.contains("(5.45)"));

        let w = check_total("t", &sum_of(&["0.2", "0.1"]), &RowSum::of("0.5", 0.5), &tol);
        assert!(w.is_some());
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("52,000 ft2"), Some(52000.0));
        assert_eq!(leading_number("area unknown"), None);
    }
}
