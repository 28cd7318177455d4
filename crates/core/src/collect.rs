//! Snapshot collection: list → sample → fetch → normalize → persist.
//!
//! Each tracked path is listed, its captures are sampled down to one per
//! bucket, and every retained capture is downloaded and normalized. A failed
//! listing or download is logged and skipped; it never aborts the run.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::fetch::ArchiveClient;
use crate::index::write_index;
use crate::normalize::html_to_text;
use crate::tagline::extract_taglines;
use crate::{Result, ScanConfig, SnapshotEntry, SnapshotRecord, hash_text, sample, slugify};

/// Somewhere captures can be listed and downloaded from.
pub trait ArchiveSource {
    /// Captures of `page_url` between two inclusive `YYYYMMDD` dates.
    fn list(&self, page_url: &str, start: &str, end: &str) -> impl Future<Output = Result<Vec<SnapshotEntry>>> + Send;

    /// Raw markup of one capture.
    fn fetch(&self, entry: &SnapshotEntry) -> impl Future<Output = Result<String>> + Send;
}

impl ArchiveSource for ArchiveClient {
    async fn list(&self, page_url: &str, start: &str, end: &str) -> Result<Vec<SnapshotEntry>> {
        self.list_snapshots(page_url, start, end).await
    }

    async fn fetch(&self, entry: &SnapshotEntry) -> Result<String> {
        self.fetch_snapshot(entry).await
    }
}

/// Drives one collection run over every configured path.
pub struct Collector<S> {
    source: S,
    config: ScanConfig,
}

impl<S: ArchiveSource> Collector<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self { source, config }
    }

    /// Collects every configured path and writes the snapshot index.
    ///
    /// Returns the records of every capture that was stored.
    pub async fn collect(&self) -> Result<Vec<SnapshotRecord>> {
        let mut records = Vec::new();
        for path in &self.config.paths {
            records.extend(self.collect_path(path).await);
        }

        write_index(&self.config.index_path(), &records, &self.config.timezone)?;
        tracing::info!(snapshots = records.len(), paths = self.config.paths.len(), "collection complete");
        Ok(records)
    }

    /// Collects the sampled captures of one path.
    pub async fn collect_path(&self, path: &str) -> Vec<SnapshotRecord> {
        let page_url = self.config.page_url(path);
        let listing = match self.source.list(&page_url, &self.config.start, &self.config.end).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!(path, error = %e, "failed to list snapshots");
                return Vec::new();
            }
        };

        let sampled = sample(&listing, self.config.sampling);
        tracing::info!(path, listed = listing.len(), sampled = sampled.len(), "collecting");

        let mut records = Vec::with_capacity(sampled.len());
        for entry in &sampled {
            match self.download(path, entry).await {
                Ok(record) => {
                    records.push(record);
                    if self.config.request_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(path, timestamp = %entry.timestamp, error = %e, "skipping snapshot");
                }
            }
        }
        records
    }

    async fn download(&self, path: &str, entry: &SnapshotEntry) -> Result<SnapshotRecord> {
        let html = self.source.fetch(entry).await?;
        store_snapshot(&self.config.data_dir, path, entry, &html)
    }
}

/// Normalizes one capture's markup and writes its `.html` and `.txt` files
/// under `data_dir/<slug>/`.
pub fn store_snapshot(data_dir: &Path, path: &str, entry: &SnapshotEntry, html: &str) -> Result<SnapshotRecord> {
    let text = html_to_text(&entry.location, html);
    let taglines = extract_taglines(html);

    let slug = slugify(path);
    let out_dir = data_dir.join(&slug);
    fs::create_dir_all(&out_dir)?;

    let html_path = out_dir.join(format!("{}.html", entry.timestamp));
    let text_path = out_dir.join(format!("{}.txt", entry.timestamp));
    fs::write(&html_path, html)?;
    fs::write(&text_path, &text)?;

    tracing::debug!(path, timestamp = %entry.timestamp, chars = text.chars().count(), "stored snapshot");

    Ok(SnapshotRecord {
        path: path.to_string(),
        slug,
        timestamp: entry.timestamp.clone(),
        archive_url: entry.location.clone(),
        html_path,
        text_path,
        text_hash: hash_text(&text),
        chars: text.chars().count(),
        taglines,
    })
}
