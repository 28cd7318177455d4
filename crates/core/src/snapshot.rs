//! Snapshot listing entries and per-capture records.
//!
//! An archive lookup produces [`SnapshotEntry`] values (capture time plus an
//! opaque fetch location). Once an entry is fetched and normalized it becomes
//! an immutable [`SnapshotRecord`], one row of the persisted snapshot index.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Timestamp;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-]+").unwrap());

/// Tagline identifier → short text, ordered by identifier.
pub type Taglines = BTreeMap<String, String>;

/// One capture from an archive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub timestamp: Timestamp,
    /// Where the archived capture can be fetched from.
    pub location: String,
}

impl SnapshotEntry {
    pub fn new(timestamp: Timestamp, location: impl Into<String>) -> Self {
        Self { timestamp, location: location.into() }
    }
}

/// A retained, successfully fetched snapshot of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Page path on the tracked site, e.g. `/about/`.
    pub path: String,
    /// Filesystem-safe grouping key derived from `path`.
    pub slug: String,
    pub timestamp: Timestamp,
    pub archive_url: String,
    pub html_path: PathBuf,
    pub text_path: PathBuf,
    /// SHA-256 of the normalized text, lowercase hex.
    pub text_hash: String,
    /// Character count of the normalized text.
    pub chars: usize,
    pub taglines: Taglines,
}

/// A snapshot record together with its normalized text.
///
/// This is the unit the analyzer works on; it never touches the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub record: SnapshotRecord,
    pub text: String,
}

impl LoadedSnapshot {
    pub fn new(record: SnapshotRecord, text: impl Into<String>) -> Self {
        Self { record, text: text.into() }
    }
}

/// Derives the filesystem-safe slug for a page path.
///
/// Runs of characters outside `[A-Za-z0-9-]` become a single `-`; the root
/// path maps to `home`.
///
/// ```rust
/// use palimpsest_core::slugify;
///
/// assert_eq!(slugify("/species/woolly-mammoth/"), "species-woolly-mammoth");
/// assert_eq!(slugify("/"), "home");
/// ```
pub fn slugify(path: &str) -> String {
    let replaced = NON_SLUG.replace_all(path.trim_matches('/'), "-");
    let slug = replaced.trim_matches('-');
    if slug.is_empty() { "home".to_string() } else { slug.to_string() }
}

/// SHA-256 hex digest of a normalized text.
pub fn hash_text(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
