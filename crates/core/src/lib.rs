//! Track how a website's content changes across web archive captures.
//!
//! The pipeline has two halves. Collection lists a page's captures, samples
//! them down to one per period ([`sample`]), and normalizes each capture's
//! markup into marker-annotated text ([`html_to_text`]). Analysis compares
//! consecutive captures of every page ([`Analyzer`]) and aggregates the
//! results into report tables ([`formatters::write_reports`]).
//!
//! # Example
//!
//! ```rust
//! use palimpsest_core::{Analyzer, LoadedSnapshot, SnapshotRecord, Taglines, Timestamp, hash_text};
//!
//! let snapshot = |ts: &str, text: &str| {
//!     let record = SnapshotRecord {
//!         path: "/".to_string(),
//!         slug: "home".to_string(),
//!         timestamp: Timestamp::parse(ts).unwrap(),
//!         archive_url: format!("https://web.archive.org/web/{}/https://colossal.com/", ts),
//!         html_path: format!("data/home/{}.html", ts).into(),
//!         text_path: format!("data/home/{}.txt", ts).into(),
//!         text_hash: hash_text(text),
//!         chars: text.chars().count(),
//!         taglines: Taglines::new(),
//!     };
//!     LoadedSnapshot::new(record, text)
//! };
//!
//! let analysis = Analyzer::default().analyze(&[
//!     snapshot("20210115093000", "[H1] Bring back the mammoth"),
//!     snapshot("20220115093000", "[H1] Reviving the mammoth ecosystem"),
//! ]);
//!
//! assert_eq!(analysis.diffs.len(), 1);
//! assert_eq!(analysis.diffs[0].keyword_deltas["climate_benefit"], 1);
//! ```

pub mod analyze;
#[cfg(feature = "fetch")]
pub mod collect;
pub mod config;
pub mod diff;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod formatters;
pub mod index;
pub mod keywords;
pub mod magnitude;
pub mod normalize;
pub mod parse;
pub mod preprocess;
pub mod sampling;
pub mod similarity;
pub mod snapshot;
pub mod tagline;
pub mod timeseries;
pub mod timestamp;

pub use analyze::{Analysis, AnalysisSummary, Analyzer, DiffRecord, KeywordTrendRow, significant_changes};
#[cfg(feature = "fetch")]
pub use collect::{ArchiveSource, Collector, store_snapshot};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use diff::UnifiedDiff;
pub use error::{PalimpsestError, Result};
#[cfg(feature = "fetch")]
pub use fetch::{ArchiveClient, FetchConfig, fetch_file, fetch_stdin, fetch_url, parse_cdx_response};
pub use formatters::write_reports;
pub use index::{load_existing, load_texts, read_index, write_index};
pub use keywords::{KeywordCounts, KeywordDeltas, KeywordRegistry, keyword_deltas};
pub use magnitude::{ChangeCategory, MagnitudeScores, MagnitudeWeights};
pub use normalize::{html_to_text, strip_source_lines};
pub use parse::Document;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use sampling::{Sampling, sample};
pub use similarity::textual_distance;
pub use snapshot::{LoadedSnapshot, SnapshotEntry, SnapshotRecord, Taglines, hash_text, slugify};
pub use tagline::{TaglineChange, TaglineComparison, compare_taglines, extract_taglines};
pub use timeseries::{MagnitudePoint, MonthlyMagnitude, magnitude_series, monthly_magnitude};
pub use timestamp::Timestamp;
