//! Archive listing and content fetching.
//!
//! This module talks to the web archive: the CDX endpoint lists the captures
//! of a page, and each capture's raw markup is downloaded from the archive
//! prefix. Local files and standard input are supported for one-off
//! normalization.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::config::{DEFAULT_ARCHIVE_PREFIX, DEFAULT_CDX_ENDPOINT, ScanConfig};
use crate::{PalimpsestError, Result, SnapshotEntry, Timestamp};

/// HTTP client configuration for archive requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// CDX listing endpoint.
    pub cdx_endpoint: String,
    /// Prefix that capture URLs are built on.
    pub archive_prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 60,
            user_agent: "Palimpsest/1.0 (research)".to_string(),
            cdx_endpoint: DEFAULT_CDX_ENDPOINT.to_string(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
        }
    }
}

impl From<&ScanConfig> for FetchConfig {
    fn from(config: &ScanConfig) -> Self {
        Self {
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
            cdx_endpoint: config.cdx_endpoint.clone(),
            archive_prefix: config.archive_prefix.clone(),
        }
    }
}

fn build_client(config: &FetchConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(PalimpsestError::HttpError)
}

fn map_send_error(e: reqwest::Error, timeout: u64) -> PalimpsestError {
    if e.is_timeout() { PalimpsestError::Timeout { timeout } } else { PalimpsestError::HttpError(e) }
}

/// Client for one web archive, reused across every request of a run.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    config: FetchConfig,
}

impl ArchiveClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self { client: build_client(&config)?, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Lists the successful captures of `page_url` between two inclusive
    /// `YYYYMMDD` dates, in the order the archive returns them.
    pub async fn list_snapshots(&self, page_url: &str, start: &str, end: &str) -> Result<Vec<SnapshotEntry>> {
        let query = Url::parse_with_params(
            &self.config.cdx_endpoint,
            &[("url", page_url), ("from", start), ("to", end), ("output", "json")],
        )
        .map_err(|e| PalimpsestError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url = %query, "listing captures");
        let response = self
            .client
            .get(query)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?
            .error_for_status()?;

        let body = response.text().await?;
        parse_cdx_response(&body, &self.config.archive_prefix)
    }

    /// Downloads the raw markup of one capture.
    pub async fn fetch_snapshot(&self, entry: &SnapshotEntry) -> Result<String> {
        let url = Url::parse(&entry.location).map_err(|e| PalimpsestError::InvalidUrl(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

/// Parses a CDX `output=json` body into listing entries.
///
/// The first row names the columns. Only rows with status `200` are kept;
/// rows with an unusable timestamp are skipped with a warning. An empty body
/// or empty array means no captures.
pub fn parse_cdx_response(body: &str, archive_prefix: &str) -> Result<Vec<SnapshotEntry>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| PalimpsestError::ListingError(format!("unexpected CDX response: {}", e)))?;
    let Some((header, rows)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PalimpsestError::ListingError(format!("CDX response has no {:?} column", name)))
    };
    let ts_col = column("timestamp")?;
    let original_col = column("original")?;
    let status_col = column("statuscode").ok();

    let prefix = archive_prefix.trim_end_matches('/');
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(col) = status_col
            && row.get(col).map(String::as_str) != Some("200")
        {
            continue;
        }
        let (Some(raw_ts), Some(original)) = (row.get(ts_col), row.get(original_col)) else {
            tracing::warn!(?row, "short CDX row skipped");
            continue;
        };
        match Timestamp::parse(raw_ts) {
            Ok(timestamp) => {
                let location = format!("{}/{}/{}", prefix, timestamp, original);
                entries.push(SnapshotEntry::new(timestamp, location));
            }
            Err(e) => tracing::warn!(error = %e, "CDX row skipped"),
        }
    }

    Ok(entries)
}

/// Fetches HTML content from a live URL.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| PalimpsestError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(PalimpsestError::InvalidUrl("URL must use http:// or https://".to_string()));
    }

    let response = build_client(config)?
        .get(parsed_url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| map_send_error(e, config.timeout))?
        .error_for_status()?;

    Ok(response.text().await?)
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(PalimpsestError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(PalimpsestError::from)
    }
}

/// Reads all of standard input.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(PalimpsestError::from)?;

    Ok(buffer)
}
