//! Reduction of a dense snapshot listing to one capture per time bucket.
//!
//! Archive listings are sparse and irregular: a page may be captured dozens of
//! times in one week and not at all for a year. [`sample`] turns such a
//! listing into a canonical sequence with at most one (the earliest) capture
//! per calendar year, quarter or month.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PalimpsestError, SnapshotEntry};

/// Bucket granularity for snapshot sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    /// Keep every capture, in input order.
    All,
    Yearly,
    Quarterly,
    #[default]
    Monthly,
}

impl Sampling {
    /// Bucket key of a capture; `None` for [`Sampling::All`].
    fn bucket(self, entry: &SnapshotEntry) -> Option<(i32, u32)> {
        let ts = &entry.timestamp;
        match self {
            Sampling::All => None,
            Sampling::Yearly => Some((ts.year(), 0)),
            Sampling::Quarterly => Some((ts.year(), ts.quarter())),
            Sampling::Monthly => Some((ts.year(), ts.month())),
        }
    }
}

impl FromStr for Sampling {
    type Err = PalimpsestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "yearly" | "year" => Ok(Self::Yearly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(PalimpsestError::ConfigError(format!(
                "Invalid sampling mode: {}. Valid options: all, yearly, quarterly, monthly",
                s
            ))),
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sampling::All => "all",
            Sampling::Yearly => "yearly",
            Sampling::Quarterly => "quarterly",
            Sampling::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// Keeps the earliest capture of every bucket, in chronological bucket order.
///
/// [`Sampling::All`] returns the listing unchanged. For the other modes the
/// input order does not matter; when two captures in a bucket share the
/// earliest timestamp the first one encountered wins.
///
/// ```rust
/// use palimpsest_core::{Sampling, SnapshotEntry, Timestamp, sample};
///
/// let listing = vec![
///     SnapshotEntry::new(Timestamp::parse("20210320000000").unwrap(), "b"),
///     SnapshotEntry::new(Timestamp::parse("20210302000000").unwrap(), "a"),
///     SnapshotEntry::new(Timestamp::parse("20210401000000").unwrap(), "c"),
/// ];
/// let sampled = sample(&listing, Sampling::Monthly);
/// let kept: Vec<_> = sampled.iter().map(|e| e.location.as_str()).collect();
/// assert_eq!(kept, ["a", "c"]);
/// ```
pub fn sample(listing: &[SnapshotEntry], mode: Sampling) -> Vec<SnapshotEntry> {
    if mode == Sampling::All {
        return listing.to_vec();
    }

    let mut chosen: BTreeMap<(i32, u32), &SnapshotEntry> = BTreeMap::new();
    for entry in listing {
        let Some(key) = mode.bucket(entry) else { continue };
        match chosen.get(&key) {
            Some(current) if current.timestamp <= entry.timestamp => {}
            _ => {
                chosen.insert(key, entry);
            }
        }
    }

    chosen.into_values().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timestamp;
    use rstest::rstest;
    use std::collections::HashSet;

    fn entry(ts: &str, loc: &str) -> SnapshotEntry {
        SnapshotEntry::new(Timestamp::parse(ts).unwrap(), loc)
    }

    fn listing() -> Vec<SnapshotEntry> {
        vec![
            entry("20210115000000", "jan-15"),
            entry("20210103000000", "jan-03"),
            entry("20210220000000", "feb-20"),
            entry("20210405000000", "apr-05"),
            entry("20211231000000", "dec-31"),
            entry("20220601000000", "jun-01"),
            entry("20220101000000", "jan-01-22"),
        ]
    }

    fn locations(entries: &[SnapshotEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.location.as_str()).collect()
    }

    #[rstest]
    #[case(Sampling::Yearly, vec!["jan-03", "jan-01-22"])]
    #[case(Sampling::Quarterly, vec!["jan-03", "apr-05", "dec-31", "jan-01-22", "jun-01"])]
    #[case(Sampling::Monthly, vec!["jan-03", "feb-20", "apr-05", "dec-31", "jan-01-22", "jun-01"])]
    fn test_sample_modes(#[case] mode: Sampling, #[case] expected: Vec<&str>) {
        let sampled = sample(&listing(), mode);
        assert_eq!(locations(&sampled), expected);
    }

    #[test]
    fn test_sample_all_preserves_order() {
        let input = listing();
        assert_eq!(sample(&input, Sampling::All), input);
    }

    #[rstest]
    #[case(Sampling::All)]
    #[case(Sampling::Yearly)]
    #[case(Sampling::Quarterly)]
    #[case(Sampling::Monthly)]
    fn test_sample_empty(#[case] mode: Sampling) {
        assert!(sample(&[], mode).is_empty());
    }

    #[rstest]
    #[case(Sampling::All)]
    #[case(Sampling::Yearly)]
    #[case(Sampling::Quarterly)]
    #[case(Sampling::Monthly)]
    fn test_sample_is_idempotent(#[case] mode: Sampling) {
        let once = sample(&listing(), mode);
        let twice = sample(&once, mode);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case(Sampling::Yearly)]
    #[case(Sampling::Quarterly)]
    #[case(Sampling::Monthly)]
    fn test_sample_bucket_invariant(#[case] mode: Sampling) {
        let input = listing();
        let sampled = sample(&input, mode);

        let buckets: HashSet<_> = input.iter().filter_map(|e| mode.bucket(e)).collect();
        assert!(sampled.len() <= buckets.len());

        for kept in &sampled {
            let key = mode.bucket(kept);
            assert!(
                input
                    .iter()
                    .filter(|e| mode.bucket(e) == key)
                    .all(|e| e.timestamp >= kept.timestamp)
            );
        }
    }

    #[test]
    fn test_sample_identical_timestamps_keep_first() {
        let input = vec![
            entry("20210301000000", "first"),
            entry("20210301000000", "second"),
        ];
        let sampled = sample(&input, Sampling::Monthly);
        assert_eq!(locations(&sampled), ["first"]);
    }

    #[test]
    fn test_sampling_from_str() {
        assert_eq!("Monthly".parse::<Sampling>().unwrap(), Sampling::Monthly);
        assert_eq!("quarter".parse::<Sampling>().unwrap(), Sampling::Quarterly);
        assert_eq!("all".parse::<Sampling>().unwrap(), Sampling::All);
        assert!("weekly".parse::<Sampling>().is_err());
        assert_eq!(Sampling::Yearly.to_string(), "yearly");
    }
}
