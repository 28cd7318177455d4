//! Error types for Palimpsest operations.
//!
//! This module defines the main error type [`PalimpsestError`] which represents
//! all possible errors that can occur while listing and fetching archive
//! snapshots, persisting the snapshot index, and writing reports.
//!
//! # Example
//!
//! ```rust
//! use palimpsest_core::{PalimpsestError, Result};
//!
//! fn require_paths(paths: &[String]) -> Result<()> {
//!     if paths.is_empty() {
//!         return Err(PalimpsestError::ConfigError("no paths to track".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for snapshot collection and change analysis.
///
/// Only collection, persistence and configuration can fail. The analysis
/// itself is total over its input: malformed markup degrades to empty fields
/// and never surfaces here.
#[derive(Error, Debug)]
pub enum PalimpsestError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and non-success status codes.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A snapshot timestamp that is not a 14-digit `YYYYMMDDHHMMSS` value.
    #[error("Invalid snapshot timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// The archive listing endpoint answered with something unexpected.
    #[error("Archive listing failed: {0}")]
    ListingError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tabular index or report encoding errors.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON encoding errors (config files, tagline columns, summaries).
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid or incomplete configuration.
    ///
    /// Fatal at startup, before any collection or analysis begins.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for PalimpsestError.
///
/// This is a convenience alias for `std::result::Result<T, PalimpsestError>`.
pub type Result<T> = std::result::Result<T, PalimpsestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PalimpsestError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_invalid_timestamp_error() {
        let err = PalimpsestError::InvalidTimestamp("2021".to_string());
        assert!(err.to_string().contains("\"2021\""));
    }

    #[test]
    fn test_timeout_error() {
        let err = PalimpsestError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PalimpsestError = io.into();
        assert!(matches!(err, PalimpsestError::IoError(_)));
    }
}
