//! Magnitude time series over significant changes.
//!
//! Each change is dated by its earlier capture. The rolling mean is a
//! trailing window of three changes within one slug (fewer at the start of a
//! slug's history); the monthly table aggregates by `(YYYY-MM, slug)`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analyze::DiffRecord;
use crate::magnitude::MagnitudeScores;

/// Width of the trailing rolling-mean window.
pub const ROLLING_WINDOW: usize = 3;

/// One significant change placed on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudePoint {
    pub date: NaiveDateTime,
    pub slug: String,
    pub path: String,
    #[serde(flatten)]
    pub scores: MagnitudeScores,
    pub magnitude_rolling_3: f64,
}

/// Magnitude aggregates for one slug within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMagnitude {
    pub year_month: String,
    pub slug: String,
    pub magnitude_mean: f64,
    pub magnitude_max: f64,
    pub magnitude_count: usize,
    pub distance_mean: f64,
    pub char_change_mean: f64,
}

/// Builds the time series, ordered by date then slug.
pub fn magnitude_series(changes: &[DiffRecord]) -> Vec<MagnitudePoint> {
    let mut by_slug: BTreeMap<&str, Vec<&DiffRecord>> = BTreeMap::new();
    for change in changes {
        by_slug.entry(change.slug.as_str()).or_default().push(change);
    }

    let mut points = Vec::with_capacity(changes.len());
    for group in by_slug.values_mut() {
        group.sort_by(|a, b| a.from_ts.cmp(&b.from_ts));
        let magnitudes: Vec<f64> = group.iter().map(|c| c.scores.magnitude_score).collect();

        for (i, change) in group.iter().enumerate() {
            let window = &magnitudes[(i + 1).saturating_sub(ROLLING_WINDOW)..=i];
            points.push(MagnitudePoint {
                date: change.from_ts.naive(),
                slug: change.slug.clone(),
                path: change.path.clone(),
                scores: change.scores,
                magnitude_rolling_3: mean(window),
            });
        }
    }

    points.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug)));
    points
}

/// Aggregates changes by `(YYYY-MM, slug)`, ordered by month then slug.
pub fn monthly_magnitude(changes: &[DiffRecord]) -> Vec<MonthlyMagnitude> {
    let mut buckets: BTreeMap<(String, &str), Vec<&DiffRecord>> = BTreeMap::new();
    for change in changes {
        buckets.entry((change.from_ts.year_month(), change.slug.as_str())).or_default().push(change);
    }

    buckets
        .into_iter()
        .map(|((year_month, slug), group)| {
            let magnitudes: Vec<f64> = group.iter().map(|c| c.scores.magnitude_score).collect();
            let distances: Vec<f64> = group.iter().map(|c| c.distance).collect();
            let char_changes: Vec<f64> = group.iter().map(|c| c.char_change as f64).collect();
            MonthlyMagnitude {
                year_month,
                slug: slug.to_string(),
                magnitude_mean: mean(&magnitudes),
                magnitude_max: magnitudes.iter().copied().fold(f64::MIN, f64::max),
                magnitude_count: group.len(),
                distance_mean: mean(&distances),
                char_change_mean: mean(&char_changes),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}
