// ==========================================
// EEU Ingest - document fetcher
// ==========================================
// Retrieves the raw bytes behind an upload URL.
// No retries: a failed fetch surfaces immediately and
// the timeout is applied at this boundary.
// ==========================================

use crate::config::IngestConfig;
use crate::parser::{LoadedDocument, ParseError, ParseResult};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{debug, info};

// ==========================================
// DocumentFetcher Trait
// ==========================================
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches a document.
    ///
    /// # Arguments
    /// - url: http(s) URL, `file://` URL or local path
    ///
    /// # Returns
    /// - Ok(LoadedDocument): bytes plus the file name taken from the URL
    /// - Err(ParseError::Fetch): transport failure or non-2xx status
    async fn fetch(&self, url: &str) -> ParseResult<LoadedDocument>;
}

/// Last path segment of a URL, query and fragment removed.
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("document")
        .to_string()
}

fn is_http(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// ==========================================
// HttpDocumentFetcher
// ==========================================
pub struct HttpDocumentFetcher {
    client: Client,
}

impl HttpDocumentFetcher {
    pub fn new(config: &IngestConfig) -> ParseResult<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|e| ParseError::Fetch(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> ParseResult<LoadedDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ParseError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        debug!(url, %status, "fetch response");
        if !status.is_success() {
            return Err(ParseError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ParseError::Fetch(format!("{}: {}", url, e)))?;
        info!(url, bytes = bytes.len(), "document fetched");
        Ok(LoadedDocument::new(bytes.to_vec(), file_name_from_url(url)))
    }
}

// ==========================================
// FileDocumentFetcher
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDocumentFetcher;

impl FileDocumentFetcher {
    fn path_of(url: &str) -> PathBuf {
        PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
    }
}

#[async_trait]
impl DocumentFetcher for FileDocumentFetcher {
    async fn fetch(&self, url: &str) -> ParseResult<LoadedDocument> {
        let path = Self::path_of(url);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ParseError::Fetch(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), bytes = bytes.len(), "document read");
        Ok(LoadedDocument::new(bytes, file_name_from_url(url)))
    }
}

// ==========================================
// DefaultDocumentFetcher (routes by scheme)
// ==========================================
pub struct DefaultDocumentFetcher {
    http: HttpDocumentFetcher,
    file: FileDocumentFetcher,
}

impl DefaultDocumentFetcher {
    pub fn new(config: &IngestConfig) -> ParseResult<Self> {
        Ok(Self {
            http: HttpDocumentFetcher::new(config)?,
            file: FileDocumentFetcher,
        })
    }
}

#[async_trait]
impl DocumentFetcher for DefaultDocumentFetcher {
    async fn fetch(&self, url: &str) -> ParseResult<LoadedDocument> {
        if is_http(url) {
            self.http.fetch(url).await
        } else {
            self.file.fetch(url).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://files.example.com/u/42/report.pdf?sig=abc"),
            "report.pdf"
        );
        assert_eq!(file_name_from_url("file:///tmp/run.sim"), "run.sim");
        assert_eq!(file_name_from_url("https://example.com/"), "example.com");
        assert_eq!(file_name_from_url(""), "document");
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_local_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let doc = FileDocumentFetcher.fetch(&format!("file://{}", path)).await.unwrap();
        assert_eq!(doc.bytes(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let err = FileDocumentFetcher.fetch("/nonexistent/eeu/report.pdf").await.unwrap_err();
        assert!(matches!(err, ParseError::Fetch(_)));
    }
}
