// ==========================================
// EEU Ingest - loaded document and decoded views
// ==========================================
// One fetched buffer, decoded lazily: PDF text pages,
// plain text / HTML, first worksheet. Each view is
// computed at most once per dispatch.
// ==========================================

use crate::parser::error::{ParseError, ParseResult};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use once_cell::sync::OnceCell;
use std::io::Cursor;
use tracing::debug;

// ==========================================
// DocumentKind (magic-number sniffing)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Zip, // .xlsx
    Cfb, // legacy .xls
    Text,
}

impl DocumentKind {
    pub fn sniff(bytes: &[u8]) -> Self {
        let head = &bytes[..bytes.len().min(1024)];
        if head.starts_with(b"PK\x03\x04") {
            DocumentKind::Zip
        } else if head.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            DocumentKind::Cfb
        } else if head.windows(5).any(|w| w == b"%PDF-") {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        }
    }
}

// ==========================================
// SheetGrid
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Cell rendered as text; integral numbers lose the trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }
}

/// First worksheet of a spreadsheet, row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Grid from CSV text; every non-blank cell is kept as text.
    pub fn from_csv_bytes(bytes: &[u8]) -> ParseResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|v| {
                        let v = v.trim();
                        if v.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(v.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Ok(Self { rows })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Header texts of one row, trimmed.
    pub fn row_texts(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|c| c.as_text()).collect())
            .unwrap_or_default()
    }

    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows.get(row).map(|r| r.iter().all(|c| c.is_empty())).unwrap_or(true)
    }
}

fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => CellValue::Empty,
                    Data::Int(i) => CellValue::Number(*i as f64),
                    Data::Float(f) => CellValue::Number(*f),
                    Data::String(s) if s.trim().is_empty() => CellValue::Empty,
                    Data::String(s) => CellValue::Text(s.trim().to_string()),
                    other => CellValue::Text(other.to_string()),
                })
                .collect()
        })
        .collect();
    SheetGrid { rows }
}

// ==========================================
// LoadedDocument
// ==========================================
pub struct LoadedDocument {
    bytes: Vec<u8>,
    file_name: String,
    kind: DocumentKind,
    pdf_pages: OnceCell<ParseResult<Vec<String>>>,
    text: OnceCell<ParseResult<String>>,
    sheet: OnceCell<ParseResult<SheetGrid>>,
}

impl std::fmt::Debug for LoadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDocument")
            .field("file_name", &self.file_name)
            .field("kind", &self.kind)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl LoadedDocument {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let kind = DocumentKind::sniff(&bytes);
        Self {
            bytes,
            file_name: file_name.into(),
            kind,
            pdf_pages: OnceCell::new(),
            text: OnceCell::new(),
            sheet: OnceCell::new(),
        }
    }

    /// PDF whose text layer is already known, one string per page.
    pub fn from_pdf_pages<S: Into<String>>(pages: Vec<S>, file_name: impl Into<String>) -> Self {
        let doc = Self::new(b"%PDF-1.7\n".to_vec(), file_name);
        let pages: Vec<String> = pages.into_iter().map(Into::into).collect();
        let _ = doc.pdf_pages.set(Ok(pages));
        doc
    }

    pub fn from_text(text: impl Into<String>, file_name: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(text.into_bytes(), file_name)
    }

    /// Spreadsheet whose first worksheet is already decoded.
    pub fn from_sheet(grid: SheetGrid, file_name: impl Into<String>) -> Self {
        let mut doc = Self::new(b"PK\x03\x04".to_vec(), file_name);
        doc.kind = DocumentKind::Zip;
        let _ = doc.sheet.set(Ok(grid));
        doc
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Text layer of a PDF split into pages on form feeds.
    pub fn pdf_pages(&self) -> ParseResult<&[String]> {
        self.pdf_pages
            .get_or_init(|| {
                if self.kind != DocumentKind::Pdf {
                    return Err(ParseError::layout("not a PDF document"));
                }
                let text = pdf_extract::extract_text_from_mem(&self.bytes)
                    .map_err(|e| ParseError::unreadable(format!("pdf: {}", e)))?;
                if text.trim().is_empty() {
                    return Err(ParseError::unreadable("PDF has no text layer"));
                }
                let pages = split_pages(&text);
                debug!(file = %self.file_name, pages = pages.len(), "pdf text extracted");
                Ok(pages)
            })
            .as_ref()
            .map(|p| p.as_slice())
            .map_err(Clone::clone)
    }

    /// Plain-text view; binary containers are rejected.
    pub fn text(&self) -> ParseResult<&str> {
        self.text
            .get_or_init(|| match self.kind {
                DocumentKind::Text => Ok(String::from_utf8_lossy(&self.bytes).into_owned()),
                other => Err(ParseError::layout(format!("{:?} document has no plain-text view", other))),
            })
            .as_ref()
            .map(|s| s.as_str())
            .map_err(Clone::clone)
    }

    /// Text view that looks like HTML.
    pub fn html(&self) -> ParseResult<&str> {
        let text = self.text()?;
        let lower_head: String = text.chars().take(4096).collect::<String>().to_ascii_lowercase();
        if lower_head.contains("<html") || text.contains("<table") || text.contains("<TABLE") {
            Ok(text)
        } else {
            Err(ParseError::layout("document is not HTML"))
        }
    }

    /// Text view split into pages on form feeds (plain-text report dumps).
    pub fn text_pages(&self) -> ParseResult<Vec<String>> {
        Ok(split_pages(self.text()?))
    }

    /// First worksheet; XLSX/XLS through calamine, anything textual as CSV.
    pub fn sheet(&self) -> ParseResult<&SheetGrid> {
        self.sheet
            .get_or_init(|| match self.kind {
                DocumentKind::Zip => {
                    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(self.bytes.clone()))
                        .map_err(|e| ParseError::unreadable(format!("xlsx: {}", e)))?;
                    let name = first_sheet_name(workbook.sheet_names())?;
                    let range = workbook
                        .worksheet_range(&name)
                        .map_err(|e| ParseError::unreadable(format!("xlsx: {}", e)))?;
                    Ok(grid_from_range(&range))
                }
                DocumentKind::Cfb => {
                    let mut workbook: Xls<_> = Xls::new(Cursor::new(self.bytes.clone()))
                        .map_err(|e| ParseError::unreadable(format!("xls: {}", e)))?;
                    let name = first_sheet_name(workbook.sheet_names())?;
                    let range = workbook
                        .worksheet_range(&name)
                        .map_err(|e| ParseError::unreadable(format!("xls: {}", e)))?;
                    Ok(grid_from_range(&range))
                }
                DocumentKind::Text => {
                    let text = self.text()?;
                    if text.contains("<table") || text.contains("<html") {
                        return Err(ParseError::layout("HTML document is not a spreadsheet"));
                    }
                    SheetGrid::from_csv_bytes(text.as_bytes())
                }
                DocumentKind::Pdf => Err(ParseError::layout("PDF document is not a spreadsheet")),
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn first_sheet_name(names: Vec<String>) -> ParseResult<String> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::unreadable("workbook has no worksheets"))
}

/// Splits on form feeds, dropping a trailing empty page.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0C').map(|p| p.to_string()).collect();
    while pages.len() > 1 && pages.last().map(|p| p.trim().is_empty()).unwrap_or(false) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_kinds() {
        assert_eq!(DocumentKind::sniff(b"%PDF-1.4 ..."), DocumentKind::Pdf);
        assert_eq!(DocumentKind::sniff(b"PK\x03\x04rest"), DocumentKind::Zip);
        assert_eq!(DocumentKind::sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0]), DocumentKind::Cfb);
        assert_eq!(DocumentKind::sniff(b"a,b,c\n1,2,3"), DocumentKind::Text);
    }

    #[test]
    fn test_split_pages() {
        let pages = split_pages("one\x0Ctwo\x0C\n");
        assert_eq!(pages, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_pdf_document_has_no_sheet_or_text() {
        let doc = LoadedDocument::from_pdf_pages(vec!["page"], "r.pdf");
        assert!(doc.sheet().is_err());
        assert!(doc.text().is_err());
        assert_eq!(doc.pdf_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_csv_sheet_keeps_text_cells() {
        let doc = LoadedDocument::from_text("zip_code,area\n02116,1000\n", "s.csv");
        let grid = doc.sheet().unwrap();
        assert_eq!(grid.cell(1, 0), Some(&CellValue::Text("02116".to_string())));
        assert!(doc.pdf_pages().is_err());
    }

    #[test]
    fn test_views_are_decoded_once() {
        let doc = LoadedDocument::from_text("a,b\n1,2\n", "s.csv");
        let first = doc.sheet().unwrap();
        let second = doc.sheet().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(doc.text().unwrap(), doc.text().unwrap()));

        let doc = LoadedDocument::from_pdf_pages(vec!["page"], "r.pdf");
        assert!(std::ptr::eq(doc.pdf_pages().unwrap(), doc.pdf_pages().unwrap()));
    }
}
