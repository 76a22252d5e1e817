// ==========================================
// EEU Ingest - layout descriptors
// ==========================================
// anchor -> bounding region -> extraction strategy
// Each format declares its regions as data; locate()
// finds them in the page text and extract() applies
// the strategy.
// ==========================================

use crate::parser::error::{ParseError, ParseResult};
use crate::parser::text_table::{is_rule_line, split_cells, split_tokens, TextTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Case-sensitive substring.
    Literal(&'static str),
    /// Case-insensitive substring.
    Insensitive(&'static str),
    /// Line made of `=` runs.
    DoubleRule,
}

impl Anchor {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Anchor::Literal(s) => line.contains(s),
            Anchor::Insensitive(s) => line.to_ascii_lowercase().contains(&s.to_ascii_lowercase()),
            Anchor::DoubleRule => is_rule_line(line, '='),
        }
    }

    pub fn in_text(&self, text: &str) -> bool {
        match self {
            Anchor::DoubleRule => text.lines().any(|l| self.matches(l)),
            Anchor::Literal(s) => text.contains(s),
            Anchor::Insensitive(s) => text.to_ascii_lowercase().contains(&s.to_ascii_lowercase()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Anchor::Literal(s) | Anchor::Insensitive(s) => format!("'{}'", s),
            Anchor::DoubleRule => "'=====' rule".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    /// First page (of any number).
    First,
    /// First page containing every listed anchor.
    FirstContaining(&'static [Anchor]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStart {
    AnchorLine,
    AfterAnchorLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEnd {
    /// Stops before the first later line matching the anchor.
    Anchor(Anchor),
    /// Stops before whichever anchor comes first.
    FirstOf(&'static [Anchor]),
    /// Stops at the first blank line after some content.
    BlankLine,
    EndOfPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Raw lines.
    Lines,
    /// Header of `header_lines` non-blank lines merged by overlap, rest is body.
    WhitespaceTable { header_lines: usize },
    /// Header lines above the first dashed rule; columns from the rule.
    RuledTable,
    /// `key: value` or `key    value` pairs.
    KeyValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    pub name: &'static str,
    pub page: PageSelector,
    pub start: Anchor,
    pub start_at: RegionStart,
    pub end: RegionEnd,
    pub strategy: Extraction,
}

/// Lines of one located region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub page_index: usize,
    pub lines: Vec<String>,
    pub strategy: Extraction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Lines(Vec<String>),
    Table { table: TextTable, body: Vec<String> },
    KeyValue(Vec<(String, String)>),
}

impl RegionSpec {
    /// Finds the region on the selected page.
    ///
    /// # Errors
    /// `LayoutNotRecognized` naming the region when the page or start anchor is missing.
    pub fn locate(&self, pages: &[String]) -> ParseResult<Region> {
        let page_index = self.select_page(pages).ok_or_else(|| {
            ParseError::layout(format!("{}: page not found", self.name))
        })?;
        self.locate_on(pages, page_index)
    }

    /// Same as [`RegionSpec::locate`] on a given page.
    pub fn locate_on(&self, pages: &[String], page_index: usize) -> ParseResult<Region> {
        let page = pages.get(page_index).ok_or_else(|| {
            ParseError::layout(format!("{}: page {} missing", self.name, page_index + 1))
        })?;
        let lines: Vec<&str> = page.lines().collect();

        let anchor_line = lines.iter().position(|l| self.start.matches(l)).ok_or_else(|| {
            ParseError::layout(format!("{}: anchor {} not found", self.name, self.start.describe()))
        })?;
        let first = match self.start_at {
            RegionStart::AnchorLine => anchor_line,
            RegionStart::AfterAnchorLine => anchor_line + 1,
        };

        let rest = &lines[first.min(lines.len())..];
        let stop = match self.end {
            RegionEnd::Anchor(end) => rest.iter().skip(1).position(|l| end.matches(l)).map(|p| p + 1),
            RegionEnd::FirstOf(ends) => rest
                .iter()
                .skip(1)
                .position(|l| ends.iter().any(|e| e.matches(l)))
                .map(|p| p + 1),
            RegionEnd::BlankLine => {
                let content = rest.iter().position(|l| !l.trim().is_empty()).unwrap_or(0);
                rest.iter()
                    .skip(content)
                    .position(|l| l.trim().is_empty())
                    .map(|p| p + content)
            }
            RegionEnd::EndOfPage => None,
        };

        if stop.is_none() && matches!(self.end, RegionEnd::Anchor(_) | RegionEnd::FirstOf(_)) {
            return Err(ParseError::layout(format!("{}: end of region not found", self.name)));
        }

        let body = &rest[..stop.unwrap_or(rest.len())];
        Ok(Region {
            name: self.name,
            page_index,
            lines: body.iter().map(|l| l.to_string()).collect(),
            strategy: self.strategy,
        })
    }

    fn select_page(&self, pages: &[String]) -> Option<usize> {
        match self.page {
            PageSelector::First => (!pages.is_empty()).then_some(0),
            PageSelector::FirstContaining(anchors) => pages
                .iter()
                .position(|p| anchors.iter().all(|a| a.in_text(p)) && self.start.in_text(p)),
        }
    }
}

impl Region {
    /// Applies the region's extraction strategy.
    pub fn extract(&self) -> ParseResult<Extracted> {
        match self.strategy {
            Extraction::Lines => Ok(Extracted::Lines(self.lines.clone())),
            Extraction::KeyValue => Ok(Extracted::KeyValue(
                self.lines.iter().filter_map(|l| split_key_value(l)).collect(),
            )),
            Extraction::WhitespaceTable { header_lines } => {
                let non_blank: Vec<(usize, &String)> = self
                    .lines
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| !l.trim().is_empty())
                    .collect();
                if non_blank.len() < header_lines {
                    return Err(ParseError::layout(format!("{}: table header missing", self.name)));
                }
                let header: Vec<&str> = non_blank[..header_lines].iter().map(|(_, l)| l.as_str()).collect();
                let body_start = non_blank
                    .get(header_lines)
                    .map(|(i, _)| *i)
                    .unwrap_or(self.lines.len());
                Ok(Extracted::Table {
                    table: TextTable::from_header(&header),
                    body: self.lines[body_start..].to_vec(),
                })
            }
            Extraction::RuledTable => {
                // a single long dash run is a title underline, not a column rule
                let rule_idx = self
                    .lines
                    .iter()
                    .position(|l| is_rule_line(l, '-') && split_tokens(l).len() >= 2)
                    .ok_or_else(|| ParseError::layout(format!("{}: column rule not found", self.name)))?;
                let header: Vec<&str> = self.lines[..rule_idx]
                    .iter()
                    .filter(|l| !l.trim().is_empty() && !is_rule_line(l, '-') && !is_rule_line(l, '='))
                    .map(|l| l.as_str())
                    .collect();
                let table = TextTable::from_rule(&header, &self.lines[rule_idx]);
                if table.is_empty() {
                    return Err(ParseError::layout(format!("{}: no columns", self.name)));
                }
                Ok(Extracted::Table {
                    table,
                    body: self.lines[rule_idx + 1..].to_vec(),
                })
            }
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// `Key: value` (first colon) or `Key    value` (first run of 2+ spaces).
pub fn split_key_value(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some((k, v)) = line.split_once(':') {
        let (k, v) = (k.trim(), v.trim());
        if !k.is_empty() && !v.is_empty() {
            return Some((k.to_string(), v.to_string()));
        }
    }
    let cells = split_cells(line);
    if cells.len() >= 2 {
        let value = cells[1..].iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        return Some((cells[0].text.clone(), value));
    }
    None
}

/// Value of the first pair whose key contains `needle` (case-insensitive).
pub fn find_value<'a>(pairs: &'a [(String, String)], needle: &str) -> Option<&'a str> {
    let needle = needle.to_ascii_lowercase();
    pairs
        .iter()
        .find(|(k, _)| k.to_ascii_lowercase().contains(&needle))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: RegionSpec = RegionSpec {
        name: "demo",
        page: PageSelector::FirstContaining(&[Anchor::Literal("SUMMARY")]),
        start: Anchor::Literal("SUMMARY"),
        start_at: RegionStart::AfterAnchorLine,
        end: RegionEnd::Anchor(Anchor::DoubleRule),
        strategy: Extraction::Lines,
    };

    fn pages() -> Vec<String> {
        vec![
            "cover page".to_string(),
            "SUMMARY\nline a\nline b\n=======\ntail".to_string(),
        ]
    }

    #[test]
    fn test_locate_between_anchors() {
        let region = SPEC.locate(&pages()).unwrap();
        assert_eq!(region.page_index, 1);
        assert_eq!(region.lines, vec!["line a", "line b"]);
    }

    #[test]
    fn test_missing_anchor_is_layout_error() {
        let err = SPEC.locate(&["nothing here".to_string()]).unwrap_err();
        assert!(err.to_string().starts_with("layout not recognized"));
    }

    #[test]
    fn test_key_value_split() {
        assert_eq!(
            split_key_value("Project:  Oak Street"),
            Some(("Project".to_string(), "Oak Street".to_string()))
        );
        assert_eq!(
            split_key_value("Conditioned Area     52,000 ft2"),
            Some(("Conditioned Area".to_string(), "52,000 ft2".to_string()))
        );
        assert_eq!(split_key_value("   "), None);
    }
}
