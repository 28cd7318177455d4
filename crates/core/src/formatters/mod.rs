//! Report writers for analysis results.

pub mod csv;
pub mod json;
pub mod markdown;

pub use self::csv::{CsvConfig, CsvFormatter, diffs_to_csv, monthly_to_csv, series_to_csv, trends_to_csv};
pub use json::{JsonConfig, JsonFormatter, summary_to_json};
pub use markdown::{MarkdownConfig, MarkdownFormatter, convert_to_markdown};

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::Result;
use crate::analyze::Analysis;
use crate::index::write_atomic;
use crate::timeseries::{magnitude_series, monthly_magnitude};

pub const DIFFS_FILE: &str = "wayback_diffs.csv";
pub const SIGNIFICANT_FILE: &str = "wayback_changes_significant.csv";
pub const TRENDS_FILE: &str = "keyword_trends.csv";
pub const TIMESERIES_FILE: &str = "magnitude_timeseries.csv";
pub const MONTHLY_FILE: &str = "magnitude_monthly.csv";
pub const CHANGELOG_FILE: &str = "wayback_changes_summary.md";
pub const SUMMARY_FILE: &str = "analysis_summary.json";

/// Writes every report table for `analysis` into `reports_dir`.
///
/// Each file is replaced atomically. Every table is written on every run; the
/// time series and monthly tables are header-only when nothing is significant.
/// Returns the paths written, in write order.
pub fn write_reports(
    reports_dir: &Path, analysis: &Analysis, threshold: f64, generated_at: DateTime<FixedOffset>,
) -> Result<Vec<PathBuf>> {
    let significant = analysis.significant(threshold);
    let csv = CsvFormatter::default();
    let mut written = Vec::new();

    let mut emit = |name: &str, content: String| -> Result<()> {
        let path = reports_dir.join(name);
        write_atomic(&path, content.as_bytes())?;
        tracing::info!(path = %path.display(), "wrote report");
        written.push(path);
        Ok(())
    };

    emit(DIFFS_FILE, csv.diffs(&analysis.diffs)?)?;
    emit(SIGNIFICANT_FILE, csv.diffs(&significant)?)?;
    emit(TRENDS_FILE, csv.trends(&analysis.trends)?)?;

    emit(TIMESERIES_FILE, csv.series(&magnitude_series(&significant))?)?;
    emit(MONTHLY_FILE, csv.monthly(&monthly_magnitude(&significant))?)?;

    let markdown =
        MarkdownFormatter::new(MarkdownConfig { threshold, generated_at: Some(generated_at), include_excerpts: true });
    emit(CHANGELOG_FILE, markdown.convert(&significant))?;

    let json = JsonFormatter::new(JsonConfig { pretty: true });
    emit(SUMMARY_FILE, json.convert(&analysis.summary(threshold))?)?;

    Ok(written)
}
