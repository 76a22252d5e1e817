// ==========================================
// EEU Ingest - parser error types
// ==========================================
// A ParseError aborts one parse attempt; the dispatcher
// decides whether another format gets a turn.
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    // ===== Layout =====
    #[error("layout not recognized: {reason}")]
    LayoutNotRecognized { reason: String },

    #[error("unreadable document: {reason}")]
    UnreadableDocument { reason: String },

    #[error("unsupported energy unit: {0}")]
    UnsupportedUnit(String),

    // ===== Dispatch =====
    #[error("unsupported file type")]
    UnsupportedFileType { attempts: Vec<String> },

    // ===== Input =====
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl ParseError {
    pub fn layout(reason: impl Into<String>) -> Self {
        ParseError::LayoutNotRecognized { reason: reason.into() }
    }

    pub fn unreadable(reason: impl Into<String>) -> Self {
        ParseError::UnreadableDocument { reason: reason.into() }
    }
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::unreadable(format!("csv: {}", err))
    }
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::unreadable(format!("spreadsheet: {}", err))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
