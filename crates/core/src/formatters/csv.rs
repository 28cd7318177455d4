use std::collections::BTreeSet;

use chrono::SecondsFormat;

use crate::Result;
use crate::analyze::{DiffRecord, KeywordTrendRow};
use crate::timeseries::{MagnitudePoint, MonthlyMagnitude};

/// Configuration for CSV report tables
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Decimal places for floating point columns
    pub precision: usize,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

impl CsvConfig {
    fn float(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}

/// Render the full (or significant) diff table.
///
/// One `delta_<category>` column is emitted per keyword category seen in the
/// records, in category order.
pub fn diffs_to_csv(diffs: &[DiffRecord], config: &CsvConfig) -> Result<String> {
    let categories: BTreeSet<&str> =
        diffs.iter().flat_map(|d| d.keyword_deltas.keys().map(String::as_str)).collect();

    let mut header: Vec<String> = [
        "path",
        "slug",
        "from_ts",
        "to_ts",
        "from_url",
        "to_url",
        "from_local",
        "to_local",
        "distance",
        "from_chars",
        "to_chars",
        "char_change",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(categories.iter().map(|c| format!("delta_{}", c)));
    header.extend(
        [
            "diff_excerpt",
            "similarity_complement",
            "char_change_ratio",
            "diff_density",
            "keyword_intensity",
            "structural_score",
            "magnitude_score",
            "change_category",
            "tagline_changes",
            "tagline_details",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    let rows = diffs.iter().map(|d| {
        let mut row = vec![
            d.path.clone(),
            d.slug.clone(),
            d.from_ts.to_string(),
            d.to_ts.to_string(),
            d.from_url.clone(),
            d.to_url.clone(),
            d.from_local.to_rfc3339_opts(SecondsFormat::Secs, false),
            d.to_local.to_rfc3339_opts(SecondsFormat::Secs, false),
            config.float(d.distance),
            d.from_chars.to_string(),
            d.to_chars.to_string(),
            d.char_change.to_string(),
        ];
        row.extend(categories.iter().map(|c| d.keyword_deltas.get(*c).copied().unwrap_or(0).to_string()));
        row.extend([
            d.diff_excerpt.clone(),
            config.float(d.scores.similarity_complement),
            config.float(d.scores.char_change_ratio),
            config.float(d.scores.diff_density),
            config.float(d.scores.keyword_intensity),
            config.float(d.scores.structural_score),
            config.float(d.scores.magnitude_score),
            d.scores.change_category.to_string(),
            d.taglines.change_count().to_string(),
            d.taglines.details(),
        ]);
        row
    });

    write_table(&header, rows)
}

/// Render the per-capture keyword trend table.
pub fn trends_to_csv(trends: &[KeywordTrendRow]) -> Result<String> {
    let categories: BTreeSet<&str> = trends.iter().flat_map(|t| t.counts.keys().map(String::as_str)).collect();

    let mut header: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    header.extend(["slug", "path", "timestamp", "year", "dt_local"].iter().map(|s| s.to_string()));

    let rows = trends.iter().map(|t| {
        let mut row: Vec<String> =
            categories.iter().map(|c| t.counts.get(*c).copied().unwrap_or(0).to_string()).collect();
        row.extend([
            t.slug.clone(),
            t.path.clone(),
            t.timestamp.to_string(),
            t.year.to_string(),
            t.local.to_rfc3339_opts(SecondsFormat::Secs, false),
        ]);
        row
    });

    write_table(&header, rows)
}

/// Render the magnitude time series.
pub fn series_to_csv(points: &[MagnitudePoint], config: &CsvConfig) -> Result<String> {
    let header: Vec<String> = [
        "date",
        "slug",
        "path",
        "magnitude_score",
        "change_category",
        "similarity_complement",
        "char_change_ratio",
        "diff_density",
        "keyword_intensity",
        "structural_score",
        "magnitude_rolling_3",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = points.iter().map(|p| {
        vec![
            p.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            p.slug.clone(),
            p.path.clone(),
            config.float(p.scores.magnitude_score),
            p.scores.change_category.to_string(),
            config.float(p.scores.similarity_complement),
            config.float(p.scores.char_change_ratio),
            config.float(p.scores.diff_density),
            config.float(p.scores.keyword_intensity),
            config.float(p.scores.structural_score),
            config.float(p.magnitude_rolling_3),
        ]
    });

    write_table(&header, rows)
}

/// Render the monthly magnitude aggregation.
pub fn monthly_to_csv(monthly: &[MonthlyMagnitude], config: &CsvConfig) -> Result<String> {
    let header: Vec<String> = [
        "year_month",
        "slug",
        "magnitude_score_mean",
        "magnitude_score_max",
        "magnitude_score_count",
        "distance_mean",
        "char_change_mean",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = monthly.iter().map(|m| {
        vec![
            m.year_month.clone(),
            m.slug.clone(),
            config.float(m.magnitude_mean),
            config.float(m.magnitude_max),
            m.magnitude_count.to_string(),
            config.float(m.distance_mean),
            config.float(m.char_change_mean),
        ]
    });

    write_table(&header, rows)
}

fn write_table(header: &[String], rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// CSV formatter for report tables
pub struct CsvFormatter {
    config: CsvConfig,
}

impl CsvFormatter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    pub fn diffs(&self, diffs: &[DiffRecord]) -> Result<String> {
        diffs_to_csv(diffs, &self.config)
    }

    pub fn trends(&self, trends: &[KeywordTrendRow]) -> Result<String> {
        trends_to_csv(trends)
    }

    pub fn series(&self, points: &[MagnitudePoint]) -> Result<String> {
        series_to_csv(points, &self.config)
    }

    pub fn monthly(&self, monthly: &[MonthlyMagnitude]) -> Result<String> {
        monthly_to_csv(monthly, &self.config)
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new(CsvConfig::default())
    }
}
