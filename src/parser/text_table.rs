// ==========================================
// EEU Ingest - whitespace table detection
// ==========================================
// Report text keeps its column layout as runs of spaces.
// Cells are split on 2+ spaces, columns come from the
// header (merged across lines by overlap) or from a
// dashed rule line, and data cells land in the column
// they overlap.
// ==========================================

const TAB_WIDTH: usize = 8;

/// A piece of text and its character span on the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub start: usize,
    pub end: usize, // exclusive
}

impl Cell {
    fn overlap(&self, start: usize, end: usize) -> usize {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        hi.saturating_sub(lo)
    }

    fn center(&self) -> f64 {
        (self.start + self.end) as f64 / 2.0
    }
}

pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - (col % TAB_WIDTH);
            out.extend(std::iter::repeat(' ').take(pad));
            col += pad;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

fn split_on(line: &str, min_gap: usize) -> Vec<Cell> {
    let chars: Vec<char> = expand_tabs(line).chars().collect();
    let mut cells = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        let mut gap = 0;
        while i < chars.len() {
            if chars[i].is_whitespace() {
                gap += 1;
                if gap >= min_gap {
                    break;
                }
            } else {
                gap = 0;
                end = i + 1;
            }
            i += 1;
        }
        cells.push(Cell {
            text: chars[start..end].iter().collect(),
            start,
            end,
        });
    }
    cells
}

/// Cells separated by two or more spaces.
pub fn split_cells(line: &str) -> Vec<Cell> {
    split_on(line, 2)
}

/// Single-whitespace tokens.
pub fn split_tokens(line: &str) -> Vec<Cell> {
    split_on(line, 1)
}

/// True for lines made only of `ch` runs and spaces, e.g. `------  ------`.
pub fn is_rule_line(line: &str, ch: char) -> bool {
    let trimmed = line.trim();
    trimmed.chars().filter(|c| *c == ch).count() >= 3
        && trimmed.chars().all(|c| c == ch || c.is_whitespace())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextTable {
    pub columns: Vec<Column>,
}

impl TextTable {
    /// Merges multi-line headers: a cell joins the column it overlaps, otherwise opens a new one.
    pub fn from_header(lines: &[&str]) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        for line in lines {
            for cell in split_cells(line) {
                let target = columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, cell.overlap(c.start, c.end)))
                    .filter(|(_, o)| *o > 0)
                    .max_by_key(|(_, o)| *o)
                    .map(|(i, _)| i);
                match target {
                    Some(i) => {
                        let col = &mut columns[i];
                        col.name = format!("{} {}", col.name, cell.text);
                        col.start = col.start.min(cell.start);
                        col.end = col.end.max(cell.end);
                    }
                    None => columns.push(Column {
                        name: cell.text,
                        start: cell.start,
                        end: cell.end,
                    }),
                }
            }
        }
        columns.sort_by_key(|c| c.start);
        Self { columns }
    }

    /// Column spans from a dashed rule; names from header tokens above each span.
    pub fn from_rule(header: &[&str], rule: &str) -> Self {
        let columns = split_tokens(rule)
            .into_iter()
            .map(|run| {
                let name = header
                    .iter()
                    .flat_map(|line| split_tokens(line))
                    .filter(|tok| tok.overlap(run.start, run.end) > 0)
                    .map(|tok| tok.text)
                    .collect::<Vec<_>>()
                    .join(" ");
                Column {
                    name,
                    start: run.start,
                    end: run.end,
                }
            })
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First column whose name contains `needle` (case-insensitive).
    pub fn column_index(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_ascii_lowercase();
        self.columns
            .iter()
            .position(|c| c.name.to_ascii_lowercase().contains(&needle))
    }

    /// Places cells into columns.
    ///
    /// Equal counts are assigned in order; otherwise each cell goes to the
    /// column it overlaps most, then to the nearest column center.
    pub fn assign(&self, cells: &[Cell]) -> Vec<Option<String>> {
        let mut out = vec![None; self.columns.len()];
        if cells.len() == self.columns.len() {
            for (slot, cell) in out.iter_mut().zip(cells) {
                *slot = Some(cell.text.clone());
            }
            return out;
        }

        for cell in cells {
            let by_overlap = self
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| (i, cell.overlap(c.start, c.end)))
                .filter(|(_, o)| *o > 0)
                .max_by_key(|(_, o)| *o)
                .map(|(i, _)| i);
            let idx = by_overlap.or_else(|| {
                self.columns
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        let da = (cell.center() - (a.start + a.end) as f64 / 2.0).abs();
                        let db = (cell.center() - (b.start + b.end) as f64 / 2.0).abs();
                        da.total_cmp(&db)
                    })
                    .map(|(i, _)| i)
            });
            if let Some(i) = idx {
                match &mut out[i] {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(&cell.text);
                    }
                    slot @ None => *slot = Some(cell.text.clone()),
                }
            }
        }
        out
    }
}

/// Label for a continuation row: a bare unit token (or blank) inherits the previous label.
pub fn rekey_continuation(label: &str, previous: Option<&str>, unit_tokens: &[&str]) -> String {
    let label = label.trim();
    let is_continuation =
        label.is_empty() || unit_tokens.iter().any(|u| u.eq_ignore_ascii_case(label));
    match (is_continuation, previous) {
        (true, Some(prev)) if label.is_empty() => prev.to_string(),
        (true, Some(prev)) => format!("{} {}", prev, label),
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cells_on_double_space() {
        let cells = split_cells("Heating (Natural Gas)   12.5   13.75");
        let texts: Vec<_> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Heating (Natural Gas)", "12.5", "13.75"]);
        assert_eq!(cells[1].start, 24);
    }

    #[test]
    fn test_merge_two_line_header() {
        let table = TextTable::from_header(&[
            "Energy End Use      Site Energy   Source Energy",
            "                    kBtu/ft2      kBtu/ft2",
        ]);
        assert_eq!(
            table.names(),
            vec!["Energy End Use", "Site Energy kBtu/ft2", "Source Energy kBtu/ft2"]
        );
    }

    #[test]
    fn test_rule_columns() {
        let header = ["          TASK   MISC", "LIGHTS  LIGHTS  EQUIP"];
        let rule = "------  ------  -----";
        let table = TextTable::from_rule(&header, rule);
        assert_eq!(table.names(), vec!["LIGHTS", "TASK LIGHTS", "MISC EQUIP"]);
    }

    #[test]
    fn test_assign_by_overlap_when_counts_differ() {
        let table = TextTable::from_header(&["Label        A       B       C"]);
        let cells = split_cells("Row          1.0             3.0");
        let assigned = table.assign(&cells);
        assert_eq!(assigned[1].as_deref(), Some("1.0"));
        assert_eq!(assigned[2], None);
        assert_eq!(assigned[3].as_deref(), Some("3.0"));
    }

    #[test]
    fn test_rekey_continuation() {
        assert_eq!(rekey_continuation("MBTU", Some("EM1 ELECTRICITY"), &["MBTU"]), "EM1 ELECTRICITY MBTU");
        assert_eq!(rekey_continuation("", Some("Fans"), &["MBTU"]), "Fans");
        assert_eq!(rekey_continuation("Pumps", Some("Fans"), &["MBTU"]), "Pumps");
    }

    #[test]
    fn test_rule_line_detection() {
        assert!(is_rule_line("   ------  ------ ---", '-'));
        assert!(is_rule_line("=========", '='));
        assert!(!is_rule_line("EM1 -- ELECTRICITY", '-'));
    }
}
