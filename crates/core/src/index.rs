//! The persisted snapshot index.
//!
//! `index.csv` holds one row per collected capture and is the analyzer's sole
//! input on re-runs. Tagline maps are stored as a JSON object in one column;
//! UTC and local datetimes are derived columns kept for spreadsheet readers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{LoadedSnapshot, PalimpsestError, Result, SnapshotRecord, Taglines, Timestamp};

/// File name of the index inside the data directory.
pub const INDEX_FILE: &str = "index.csv";

const COLUMNS: [&str; 11] = [
    "path",
    "slug",
    "timestamp",
    "archive_url",
    "html_path",
    "text_path",
    "text_hash",
    "chars",
    "taglines",
    "dt_utc",
    "dt_local",
];

/// Flat CSV shape of a [`SnapshotRecord`].
#[derive(Debug, Serialize, Deserialize)]
struct IndexRow {
    path: String,
    slug: String,
    timestamp: String,
    archive_url: String,
    html_path: String,
    text_path: String,
    text_hash: String,
    chars: usize,
    taglines: String,
    dt_utc: String,
    dt_local: String,
}

impl IndexRow {
    fn from_record(record: &SnapshotRecord, timezone: &str) -> Result<Self> {
        Ok(Self {
            path: record.path.clone(),
            slug: record.slug.clone(),
            timestamp: record.timestamp.to_string(),
            archive_url: record.archive_url.clone(),
            html_path: record.html_path.to_string_lossy().into_owned(),
            text_path: record.text_path.to_string_lossy().into_owned(),
            text_hash: record.text_hash.clone(),
            chars: record.chars,
            taglines: serde_json::to_string(&record.taglines)?,
            dt_utc: record.timestamp.to_utc().to_rfc3339(),
            dt_local: record.timestamp.to_local(timezone).to_rfc3339(),
        })
    }

    fn into_record(self) -> Result<SnapshotRecord> {
        let taglines: Taglines =
            if self.taglines.trim().is_empty() { Taglines::new() } else { serde_json::from_str(&self.taglines)? };
        Ok(SnapshotRecord {
            path: self.path,
            slug: self.slug,
            timestamp: Timestamp::parse(&self.timestamp)?,
            archive_url: self.archive_url,
            html_path: PathBuf::from(self.html_path),
            text_path: PathBuf::from(self.text_path),
            text_hash: self.text_hash,
            chars: self.chars,
            taglines,
        })
    }
}

/// Location of the index inside `data_dir`.
pub fn index_path(data_dir: &Path) -> PathBuf {
    data_dir.join(INDEX_FILE)
}

/// Writes the index, replacing any previous file atomically.
pub fn write_index(path: &Path, records: &[SnapshotRecord], timezone: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(IndexRow::from_record(record, timezone)?)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    write_atomic(path, &bytes)?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote snapshot index");
    Ok(())
}

/// Reads every row of the index.
///
/// # Errors
///
/// Returns [`PalimpsestError::FileNotFound`] for a missing file, and CSV,
/// JSON or timestamp errors for a malformed row.
pub fn read_index(path: &Path) -> Result<Vec<SnapshotRecord>> {
    if !path.exists() {
        return Err(PalimpsestError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize::<IndexRow>().map(|row| row?.into_record()).collect()
}

/// Loads the index of `data_dir` if it is usable for analysis.
///
/// A missing, empty or unreadable index, or one that references a markup or
/// text file that no longer exists, yields `None` so the caller collects
/// afresh instead of analyzing partial data.
pub fn load_existing(data_dir: &Path) -> Option<Vec<SnapshotRecord>> {
    let path = index_path(data_dir);
    if !path.exists() {
        tracing::info!(path = %path.display(), "no existing index, fresh collection needed");
        return None;
    }

    let records = match read_index(&path) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "existing index is unreadable");
            return None;
        }
    };

    if records.is_empty() {
        tracing::info!(path = %path.display(), "existing index is empty");
        return None;
    }

    let missing = records.iter().filter(|r| !r.text_path.exists() || !r.html_path.exists()).count();
    if missing > 0 {
        tracing::warn!(missing, total = records.len(), "index references missing snapshot files");
        return None;
    }

    log_index_summary(&records);
    Some(records)
}

fn log_index_summary(records: &[SnapshotRecord]) {
    let mut per_path: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *per_path.entry(r.path.as_str()).or_default() += 1;
    }
    let earliest = records.iter().map(|r| &r.timestamp).min();
    let latest = records.iter().map(|r| &r.timestamp).max();

    tracing::info!(
        snapshots = records.len(),
        paths = per_path.len(),
        from = %earliest.map(|t| t.naive().date().to_string()).unwrap_or_default(),
        to = %latest.map(|t| t.naive().date().to_string()).unwrap_or_default(),
        "found existing snapshot data"
    );

    let mut counts: Vec<(&str, usize)> = per_path.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    for (path, count) in counts {
        tracing::info!(path, snapshots = count, "indexed path");
    }
}

/// Reads the normalized text of every record.
pub fn load_texts(records: Vec<SnapshotRecord>) -> Result<Vec<LoadedSnapshot>> {
    records
        .into_iter()
        .map(|record| {
            if !record.text_path.exists() {
                return Err(PalimpsestError::FileNotFound(record.text_path.clone()));
            }
            let text = fs::read_to_string(&record.text_path)?;
            Ok(LoadedSnapshot::new(record, text))
        })
        .collect()
}

/// Writes `bytes` to a temporary sibling of `path`, then renames it into
/// place, so readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_text;
    use tempfile::TempDir;

    fn record(dir: &Path, slug: &str, ts: &str, text: &str) -> SnapshotRecord {
        let html_path = dir.join(slug).join(format!("{}.html", ts));
        let text_path = dir.join(slug).join(format!("{}.txt", ts));
        fs::create_dir_all(dir.join(slug)).unwrap();
        fs::write(&html_path, format!("<p>{}</p>", text)).unwrap();
        fs::write(&text_path, text).unwrap();

        let mut taglines = Taglines::new();
        taglines.insert("h1".to_string(), "Bring back the \"mammoth\", again".to_string());
        taglines.insert("meta_description".to_string(), "Line one\nline two".to_string());

        SnapshotRecord {
            path: format!("/{}/", slug),
            slug: slug.to_string(),
            timestamp: Timestamp::parse(ts).unwrap(),
            archive_url: format!("https://web.archive.org/web/{}/https://colossal.com/{}/", ts, slug),
            html_path,
            text_path,
            text_hash: hash_text(text),
            chars: text.chars().count(),
            taglines,
        }
    }

    #[test]
    fn test_index_round_trip() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            record(dir.path(), "home", "20210115093000", "[H1] Bring back the mammoth"),
            record(dir.path(), "about", "20220301120000", "[P_0] Our team, \"quoted\""),
        ];
        let path = index_path(dir.path());
        write_index(&path, &records, "Europe/Zurich").unwrap();

        let loaded = read_index(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_index_columns() {
        let dir = TempDir::new().unwrap();
        let records = vec![record(dir.path(), "home", "20210115093000", "text")];
        let path = index_path(dir.path());
        write_index(&path, &records, "Europe/Zurich").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
        assert!(content.contains("2021-01-15T09:30:00+00:00"));
        assert!(content.contains("2021-01-15T10:30:00+01:00"));
        assert!(!dir.path().join(".index.csv.tmp").exists());
    }

    #[test]
    fn test_load_existing_missing_index() {
        let dir = TempDir::new().unwrap();
        assert!(load_existing(dir.path()).is_none());
    }

    #[test]
    fn test_load_existing_empty_index() {
        let dir = TempDir::new().unwrap();
        write_index(&index_path(dir.path()), &[], "UTC").unwrap();
        assert!(load_existing(dir.path()).is_none());
    }

    #[test]
    fn test_load_existing_with_missing_file() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            record(dir.path(), "home", "20210115093000", "one"),
            record(dir.path(), "home", "20210215093000", "two"),
        ];
        write_index(&index_path(dir.path()), &records, "UTC").unwrap();
        assert_eq!(load_existing(dir.path()).map(|r| r.len()), Some(2));

        fs::remove_file(&records[1].text_path).unwrap();
        assert!(load_existing(dir.path()).is_none());
    }

    #[test]
    fn test_load_existing_corrupt_index() {
        let dir = TempDir::new().unwrap();
        fs::write(index_path(dir.path()), "path,slug\n\"unterminated").unwrap();
        assert!(load_existing(dir.path()).is_none());
    }

    #[test]
    fn test_load_texts() {
        let dir = TempDir::new().unwrap();
        let records = vec![record(dir.path(), "home", "20210115093000", "[H1] Mammoth")];
        let loaded = load_texts(records.clone()).unwrap();
        assert_eq!(loaded[0].text, "[H1] Mammoth");
        assert_eq!(loaded[0].record, records[0]);

        fs::remove_file(&records[0].text_path).unwrap();
        assert!(matches!(load_texts(records), Err(PalimpsestError::FileNotFound(_))));
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("report.csv");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
