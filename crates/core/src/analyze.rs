//! Pairwise change analysis over the snapshot table.
//!
//! The [`Analyzer`] groups snapshots by slug, sorts each group by capture
//! time, and compares every adjacent pair. Everything here is pure: inputs are
//! in-memory [`LoadedSnapshot`]s and outputs are fresh row collections, so the
//! same table always produces the same records regardless of fetch order.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::diff::UnifiedDiff;
use crate::keywords::{KeywordCounts, KeywordDeltas, KeywordRegistry, keyword_deltas};
use crate::magnitude::{ChangeCategory, MagnitudeScores, MagnitudeWeights, PairMetrics, score};
use crate::normalize::strip_source_lines;
use crate::similarity::textual_distance;
use crate::tagline::{TaglineComparison, compare_taglines};
use crate::{LoadedSnapshot, Timestamp};

/// Number of entries in the "top changes" lists.
pub const TOP_CHANGES: usize = 5;

/// Comparison of two consecutive captures of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    pub path: String,
    pub slug: String,
    pub from_ts: Timestamp,
    pub to_ts: Timestamp,
    pub from_url: String,
    pub to_url: String,
    pub from_local: DateTime<FixedOffset>,
    pub to_local: DateTime<FixedOffset>,
    /// Shingle-set Jaccard distance of the cleaned texts.
    pub distance: f64,
    pub from_chars: usize,
    pub to_chars: usize,
    pub char_change: i64,
    pub keyword_deltas: KeywordDeltas,
    pub diff_excerpt: String,
    #[serde(flatten)]
    pub scores: MagnitudeScores,
    pub taglines: TaglineComparison,
}

/// Keyword counts of a single capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordTrendRow {
    pub slug: String,
    pub path: String,
    pub timestamp: Timestamp,
    pub year: i32,
    pub local: DateTime<FixedOffset>,
    pub counts: KeywordCounts,
}

/// Every table derived from one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// One record per adjacent pair, grouped by slug then ordered by time.
    pub diffs: Vec<DiffRecord>,
    /// One row per capture, grouped by slug then ordered by time.
    pub trends: Vec<KeywordTrendRow>,
}

impl Analysis {
    /// Diff records whose distance meets or exceeds `threshold`.
    pub fn significant(&self, threshold: f64) -> Vec<DiffRecord> {
        significant_changes(&self.diffs, threshold)
    }

    pub fn summary(&self, threshold: f64) -> AnalysisSummary {
        AnalysisSummary::new(&self.diffs, &self.significant(threshold), threshold)
    }
}

/// Filters `diffs` down to the significant-change subset (boundary inclusive).
pub fn significant_changes(diffs: &[DiffRecord], threshold: f64) -> Vec<DiffRecord> {
    diffs.iter().filter(|d| d.distance >= threshold).cloned().collect()
}

/// Computes diff records and keyword trends from snapshot texts.
#[derive(Debug, Clone)]
pub struct Analyzer {
    registry: KeywordRegistry,
    weights: MagnitudeWeights,
    timezone: String,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(KeywordRegistry::default(), MagnitudeWeights::default())
    }
}

impl Analyzer {
    pub fn new(registry: KeywordRegistry, weights: MagnitudeWeights) -> Self {
        Self { registry, weights, timezone: "UTC".to_string() }
    }

    /// Sets the IANA zone used for the local datetime columns.
    pub fn with_timezone(mut self, zone: impl Into<String>) -> Self {
        self.timezone = zone.into();
        self
    }

    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// Analyzes the full snapshot table.
    pub fn analyze(&self, snapshots: &[LoadedSnapshot]) -> Analysis {
        let groups = group_by_slug(snapshots);
        let mut analysis = Analysis::default();

        for (slug, group) in &groups {
            tracing::debug!(slug, snapshots = group.len(), "comparing captures");
            analysis.diffs.extend(group.windows(2).map(|pair| self.compare(pair[0], pair[1])));
            analysis.trends.extend(group.iter().map(|snap| self.trend_row(snap)));
        }

        tracing::info!(
            slugs = groups.len(),
            snapshots = snapshots.len(),
            comparisons = analysis.diffs.len(),
            "analysis complete"
        );
        analysis
    }

    /// Compares an earlier capture `a` with a later capture `b` of the same page.
    pub fn compare(&self, a: &LoadedSnapshot, b: &LoadedSnapshot) -> DiffRecord {
        let old = strip_source_lines(&a.text);
        let new = strip_source_lines(&b.text);

        let distance = textual_distance(&old, &new);
        let deltas = keyword_deltas(&self.registry.count(&old), &self.registry.count(&new));

        let from_label = format!("{}@{}", a.record.slug, a.record.timestamp);
        let to_label = format!("{}@{}", b.record.slug, b.record.timestamp);
        let diff = UnifiedDiff::compute(&old, &new, &from_label, &to_label);

        let scores = score(
            &PairMetrics { old: &old, new: &new, distance, diff: &diff, keyword_deltas: &deltas },
            &self.weights,
        );

        let from_chars = old.chars().count();
        let to_chars = new.chars().count();

        DiffRecord {
            path: a.record.path.clone(),
            slug: a.record.slug.clone(),
            from_ts: a.record.timestamp.clone(),
            to_ts: b.record.timestamp.clone(),
            from_url: a.record.archive_url.clone(),
            to_url: b.record.archive_url.clone(),
            from_local: a.record.timestamp.to_local(&self.timezone),
            to_local: b.record.timestamp.to_local(&self.timezone),
            distance,
            from_chars,
            to_chars,
            char_change: to_chars as i64 - from_chars as i64,
            keyword_deltas: deltas,
            diff_excerpt: diff.excerpt(),
            scores,
            taglines: compare_taglines(&a.record.taglines, &b.record.taglines),
        }
    }

    fn trend_row(&self, snapshot: &LoadedSnapshot) -> KeywordTrendRow {
        let record = &snapshot.record;
        KeywordTrendRow {
            slug: record.slug.clone(),
            path: record.path.clone(),
            timestamp: record.timestamp.clone(),
            year: record.timestamp.year(),
            local: record.timestamp.to_local(&self.timezone),
            counts: self.registry.count(&strip_source_lines(&snapshot.text)),
        }
    }
}

/// Slug → captures sorted by timestamp. The sort is stable, so duplicate
/// timestamps keep their input order.
fn group_by_slug(snapshots: &[LoadedSnapshot]) -> BTreeMap<&str, Vec<&LoadedSnapshot>> {
    let mut groups: BTreeMap<&str, Vec<&LoadedSnapshot>> = BTreeMap::new();
    for snap in snapshots {
        groups.entry(snap.record.slug.as_str()).or_default().push(snap);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.record.timestamp.cmp(&b.record.timestamp));
    }
    groups
}

/// Headline figures of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_comparisons: usize,
    pub significant_changes: usize,
    pub threshold: f64,
    /// Significant changes per slug, most changed first.
    pub changes_by_slug: Vec<SlugChangeCount>,
    /// Largest distances among the significant changes.
    pub top_by_distance: Vec<ChangeRef>,
    /// Largest magnitudes among the significant changes.
    pub top_by_magnitude: Vec<ChangeRef>,
    pub magnitude: Option<MagnitudeStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugChangeCount {
    pub slug: String,
    pub count: usize,
}

/// Pointer to one diff record in summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRef {
    pub slug: String,
    pub from_ts: Timestamp,
    pub to_ts: Timestamp,
    pub distance: f64,
    pub magnitude_score: f64,
    pub change_category: ChangeCategory,
}

impl From<&DiffRecord> for ChangeRef {
    fn from(d: &DiffRecord) -> Self {
        Self {
            slug: d.slug.clone(),
            from_ts: d.from_ts.clone(),
            to_ts: d.to_ts.clone(),
            distance: d.distance,
            magnitude_score: d.scores.magnitude_score,
            change_category: d.scores.change_category,
        }
    }
}

/// Magnitude statistics over the significant changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudeStats {
    pub average: f64,
    pub maximum: f64,
    /// Non-empty categories, most frequent first.
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: ChangeCategory,
    pub count: usize,
    pub percent: f64,
}

impl AnalysisSummary {
    pub fn new(diffs: &[DiffRecord], significant: &[DiffRecord], threshold: f64) -> Self {
        let mut per_slug: BTreeMap<&str, usize> = BTreeMap::new();
        for d in significant {
            *per_slug.entry(d.slug.as_str()).or_default() += 1;
        }
        let mut changes_by_slug: Vec<SlugChangeCount> =
            per_slug.into_iter().map(|(slug, count)| SlugChangeCount { slug: slug.to_string(), count }).collect();
        changes_by_slug.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_comparisons: diffs.len(),
            significant_changes: significant.len(),
            threshold,
            changes_by_slug,
            top_by_distance: top_by(significant, |d| d.distance),
            top_by_magnitude: top_by(significant, |d| d.scores.magnitude_score),
            magnitude: MagnitudeStats::from_changes(significant),
        }
    }
}

impl MagnitudeStats {
    fn from_changes(changes: &[DiffRecord]) -> Option<Self> {
        if changes.is_empty() {
            return None;
        }
        let total = changes.len() as f64;
        let average = changes.iter().map(|d| d.scores.magnitude_score).sum::<f64>() / total;
        let maximum = changes.iter().map(|d| d.scores.magnitude_score).fold(0.0, f64::max);

        let mut counts: BTreeMap<ChangeCategory, usize> = BTreeMap::new();
        for d in changes {
            *counts.entry(d.scores.change_category).or_default() += 1;
        }
        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count, percent: count as f64 / total * 100.0 })
            .collect();
        // most frequent first, heavier category first on ties
        categories.sort_by(|a, b| b.count.cmp(&a.count).then(b.category.cmp(&a.category)));

        Some(Self { average, maximum, categories })
    }
}

/// The first [`TOP_CHANGES`] records by descending `key`; ties keep input order.
fn top_by(changes: &[DiffRecord], key: impl Fn(&DiffRecord) -> f64) -> Vec<ChangeRef> {
    let mut sorted: Vec<&DiffRecord> = changes.iter().collect();
    sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
    sorted.into_iter().take(TOP_CHANGES).map(ChangeRef::from).collect()
}
