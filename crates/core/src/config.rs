//! Run configuration.
//!
//! A [`ScanConfig`] is assembled once before a run: defaults, then an optional
//! JSON config file, then command-line overrides. Every field of the file is
//! optional.
//!
//! # Example
//!
//! ```rust
//! use palimpsest_core::{Sampling, ScanConfig};
//!
//! let config = ScanConfig::builder()
//!     .base_url("https://example.org")
//!     .paths(vec!["/".to_string(), "/about/".to_string()])
//!     .sampling(Sampling::Quarterly)
//!     .significant_change(0.1)
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::index::index_path;
use crate::keywords::KeywordRegistry;
use crate::magnitude::MagnitudeWeights;
use crate::{PalimpsestError, Result, Sampling};

/// Pages tracked when no paths are configured.
pub const DEFAULT_PATHS: &[&str] = &[
    "/",
    "/about/",
    "/species/woolly-mammoth/",
    "/species/thylacine/",
    "/species/dodo/",
    "/species/dire-wolf/",
    "/blog/",
    "/news/",
    "/press/",
    "/foundation/",
    "/how-it-works/",
    "/careers/",
    "/technology/",
    "/science/",
    "/team/",
    "/investors/",
    "/contact/",
    "/faq/",
    "/publications/",
    "/media/",
];

pub const DEFAULT_CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "https://web.archive.org/web";

const DATE_FORMAT: &str = "%Y%m%d";

/// Everything a collection and analysis run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Site whose pages are tracked.
    pub base_url: String,
    /// Inclusive lower capture date, `YYYYMMDD`.
    pub start: String,
    /// Inclusive upper capture date, `YYYYMMDD`.
    pub end: String,
    pub paths: Vec<String>,
    pub sampling: Sampling,
    /// Distance at or above which a change is significant.
    pub significant_change: f64,
    /// Pause after each successful download.
    pub request_delay_ms: u64,
    /// IANA zone for local datetime columns.
    pub timezone: String,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub cdx_endpoint: String,
    pub archive_prefix: String,
    /// JSON keyword registry replacing the built-in one.
    pub keywords_file: Option<PathBuf>,
    pub magnitude: MagnitudeWeights,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: "https://colossal.com".to_string(),
            start: "20210101".to_string(),
            end: "20251231".to_string(),
            paths: DEFAULT_PATHS.iter().map(|p| p.to_string()).collect(),
            sampling: Sampling::Monthly,
            significant_change: 0.05,
            request_delay_ms: 1000,
            timezone: "Europe/Zurich".to_string(),
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            user_agent: "Palimpsest/1.0 (research)".to_string(),
            timeout: 60,
            cdx_endpoint: DEFAULT_CDX_ENDPOINT.to_string(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            keywords_file: None,
            magnitude: MagnitudeWeights::default(),
        }
    }
}

impl ScanConfig {
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }

    /// Parses a JSON config; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PalimpsestError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| PalimpsestError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// `$CONFIG_DIR/palimpsest/config.json`, when a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("palimpsest").join("config.json"))
    }

    /// Loads `explicit` if given, else the default config file if present,
    /// else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config file");
            return Self::from_file(path);
        }
        match Self::default_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading default config file");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Checks every field that could make a run fail or mislead.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| PalimpsestError::ConfigError(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PalimpsestError::ConfigError(format!("base URL must be http(s): {}", self.base_url)));
        }

        let start = parse_date("start", &self.start)?;
        let end = parse_date("end", &self.end)?;
        if start > end {
            return Err(PalimpsestError::ConfigError(format!(
                "start date {} is after end date {}",
                self.start, self.end
            )));
        }

        if self.paths.is_empty() {
            return Err(PalimpsestError::ConfigError("no paths to track".to_string()));
        }
        if let Some(bad) = self.paths.iter().find(|p| !p.starts_with('/')) {
            return Err(PalimpsestError::ConfigError(format!("path must start with '/': {:?}", bad)));
        }

        if !(0.0..=1.0).contains(&self.significant_change) {
            return Err(PalimpsestError::ConfigError(format!(
                "significant-change threshold must be within [0, 1], got {}",
                self.significant_change
            )));
        }

        if self.timezone.parse::<Tz>().is_err() {
            return Err(PalimpsestError::ConfigError(format!("unknown timezone {:?}", self.timezone)));
        }

        if self.timeout == 0 {
            return Err(PalimpsestError::ConfigError("timeout must be at least one second".to_string()));
        }

        self.magnitude.validate()?;

        if let Some(path) = &self.keywords_file {
            KeywordRegistry::from_json_file(path).map_err(|e| {
                PalimpsestError::ConfigError(format!("keyword registry {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    /// The keyword registry for this run.
    pub fn keyword_registry(&self) -> Result<KeywordRegistry> {
        match &self.keywords_file {
            Some(path) => KeywordRegistry::from_json_file(path),
            None => Ok(KeywordRegistry::default()),
        }
    }

    /// Full URL of a tracked page.
    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn index_path(&self) -> PathBuf {
        index_path(&self.data_dir)
    }
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PalimpsestError::ConfigError(format!("{} date must be YYYYMMDD, got {:?}", name, value)));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| PalimpsestError::ConfigError(format!("{} date {:?}: {}", name, value, e)))
}

/// Builder for ScanConfig.
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ScanConfig::default() }
    }

    /// Starts from an existing config, e.g. one loaded from a file.
    pub fn from_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.base_url = value.into();
        self
    }

    pub fn start(mut self, value: impl Into<String>) -> Self {
        self.config.start = value.into();
        self
    }

    pub fn end(mut self, value: impl Into<String>) -> Self {
        self.config.end = value.into();
        self
    }

    pub fn paths(mut self, value: Vec<String>) -> Self {
        self.config.paths = value;
        self
    }

    pub fn sampling(mut self, value: Sampling) -> Self {
        self.config.sampling = value;
        self
    }

    pub fn significant_change(mut self, value: f64) -> Self {
        self.config.significant_change = value;
        self
    }

    pub fn request_delay_ms(mut self, value: u64) -> Self {
        self.config.request_delay_ms = value;
        self
    }

    pub fn timezone(mut self, value: impl Into<String>) -> Self {
        self.config.timezone = value.into();
        self
    }

    pub fn data_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.config.data_dir = value.into();
        self
    }

    pub fn reports_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.config.reports_dir = value.into();
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    pub fn timeout(mut self, value: u64) -> Self {
        self.config.timeout = value;
        self
    }

    pub fn cdx_endpoint(mut self, value: impl Into<String>) -> Self {
        self.config.cdx_endpoint = value.into();
        self
    }

    pub fn archive_prefix(mut self, value: impl Into<String>) -> Self {
        self.config.archive_prefix = value.into();
        self
    }

    pub fn keywords_file(mut self, value: Option<PathBuf>) -> Self {
        self.config.keywords_file = value;
        self
    }

    pub fn magnitude(mut self, value: MagnitudeWeights) -> Self {
        self.config.magnitude = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ScanConfig {
        self.config
    }
}

impl Default for ScanConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.paths.len(), 20);
        assert_eq!(config.sampling, Sampling::Monthly);
        assert_eq!(config.significant_change, 0.05);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScanConfig::from_json_str(
            r#"{"base_url": "https://example.org", "sampling": "yearly", "magnitude": {"similarity": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://example.org");
        assert_eq!(config.sampling, Sampling::Yearly);
        assert_eq!(config.timezone, "Europe/Zurich");
        assert_eq!(config.magnitude.similarity, 0.5);
        assert_eq!(config.magnitude.keyword_baseline, 10.0);
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"paths": ["/"], "request_delay_ms": 0}"#).unwrap();

        let config = ScanConfig::load(Some(&path)).unwrap();
        assert_eq!(config.paths, vec!["/".to_string()]);
        assert_eq!(config.request_delay_ms, 0);

        assert!(matches!(
            ScanConfig::from_file(&dir.path().join("missing.json")),
            Err(PalimpsestError::FileNotFound(_))
        ));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ScanConfig::from_file(&path), Err(PalimpsestError::ConfigError(_))));
    }

    #[rstest]
    #[case::bad_url(ScanConfig::builder().base_url("not a url").build())]
    #[case::ftp_url(ScanConfig::builder().base_url("ftp://example.org").build())]
    #[case::short_date(ScanConfig::builder().start("2021").build())]
    #[case::impossible_date(ScanConfig::builder().end("20211341").build())]
    #[case::inverted_dates(ScanConfig::builder().start("20250101").end("20210101").build())]
    #[case::no_paths(ScanConfig::builder().paths(vec![]).build())]
    #[case::relative_path(ScanConfig::builder().paths(vec!["about".to_string()]).build())]
    #[case::threshold_high(ScanConfig::builder().significant_change(1.5).build())]
    #[case::threshold_negative(ScanConfig::builder().significant_change(-0.1).build())]
    #[case::timezone(ScanConfig::builder().timezone("Mars/Olympus").build())]
    #[case::timeout(ScanConfig::builder().timeout(0).build())]
    #[case::weights(ScanConfig::builder()
        .magnitude(MagnitudeWeights { keyword_baseline: -1.0, ..Default::default() })
        .build())]
    fn test_validate_rejects(#[case] config: ScanConfig) {
        assert!(matches!(config.validate(), Err(PalimpsestError::ConfigError(_))));
    }

    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(""))]
    #[case::no_categories(Some("{}"))]
    #[case::malformed(Some("[\"moonshot\"]"))]
    fn test_validate_rejects_bad_keyword_registry(#[case] content: Option<&str>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }

        let config = ScanConfig::builder().keywords_file(Some(path)).build();
        assert!(matches!(config.validate(), Err(PalimpsestError::ConfigError(_))));
    }

    #[test]
    fn test_validate_accepts_keyword_registry_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");
        fs::write(&path, r#"{"hype": ["moonshot"]}"#).unwrap();
        assert!(ScanConfig::builder().keywords_file(Some(path)).build().validate().is_ok());
    }

    #[test]
    fn test_page_url() {
        let config = ScanConfig::builder().base_url("https://colossal.com/").build();
        assert_eq!(config.page_url("/about/"), "https://colossal.com/about/");
    }

    #[test]
    fn test_keyword_registry_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");
        fs::write(&path, r#"{"hype": ["moonshot"]}"#).unwrap();

        let config = ScanConfig::builder().keywords_file(Some(path)).build();
        let registry = config.keyword_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(ScanConfig::default().keyword_registry().unwrap().len(), 15);
    }
}
