//! Tab export fetcher.
//!
//! Blocking reqwest client (no Tokio runtime required). One GET per tab,
//! no retry: the caller is an interactive session and the user's refresh
//! is the recovery path.

use std::time::Duration;

use crate::csv::{decode_body, parse_table};
use crate::error::FetchError;
use crate::table::TabularData;

pub const USER_AGENT: &str = concat!("funclib/", env!("CARGO_PKG_VERSION"));

const ERROR_EXCERPT_CHARS: usize = 200;

/// Anything that can hand back a tab as a table.
///
/// `bust` is an opaque cache-bust token forwarded to the upstream so
/// intermediaries cannot serve a stale export.
pub trait SheetSource {
    fn fetch(&self, tab: &str, with_header: bool, bust: Option<&str>) -> Result<TabularData, FetchError>;
}

/// Fetches tabs of one spreadsheet document through the CSV export endpoint.
#[derive(Clone)]
pub struct CsvFetcher {
    http: reqwest::blocking::Client,
    base_url: String,
    sheet_id: String,
}

impl CsvFetcher {
    /// Create a fetcher for `sheet_id` on `base_url`.
    pub fn with_base_url(base_url: &str, sheet_id: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id: sheet_id.to_string(),
        })
    }

    /// Export URL for one tab. The cache-bust parameter is only present
    /// when a token is set.
    pub fn export_url(&self, tab: &str, bust: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/gviz/tq?tqx=out:csv&sheet={}",
            self.base_url,
            self.sheet_id,
            urlencoding::encode(tab),
        );
        if let Some(token) = bust.filter(|t| !t.is_empty()) {
            url.push_str("&cb=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_EXCERPT_CHARS).collect();
            return Err(FetchError::Http(status.as_u16(), excerpt));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Network(format!("failed to read response body: {}", e)))
    }
}

impl SheetSource for CsvFetcher {
    fn fetch(&self, tab: &str, with_header: bool, bust: Option<&str>) -> Result<TabularData, FetchError> {
        let url = self.export_url(tab, bust);
        log::debug!("GET {}", url);

        let bytes = self.get_bytes(&url)?;
        let table = parse_table(&decode_body(bytes), with_header)?;

        log::info!(
            "fetched tab '{}': {} rows x {} cols",
            tab,
            table.row_count(),
            table.width(),
        );
        Ok(table)
    }
}
