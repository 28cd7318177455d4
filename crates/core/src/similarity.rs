//! Shingle-based textual distance.
//!
//! Texts are lowercased, whitespace runs collapse to one space, and every
//! overlapping 3-character window becomes a shingle. Distance is the Jaccard
//! distance of the two shingle *sets*.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Width of a shingle in characters.
pub const SHINGLE_WIDTH: usize = 3;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The set of 3-character shingles of `text`.
///
/// A normalized text shorter than three characters yields no shingles.
pub fn shingles(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE_RUN.replace_all(&lowered, " ");
    let chars: Vec<char> = collapsed.chars().collect();

    chars.windows(SHINGLE_WIDTH).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity of two shingle sets; `1.0` when both are empty.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Textual distance in `[0, 1]`: `0` for identical shingle sets, `1` for
/// disjoint ones.
///
/// # Example
///
/// ```rust
/// use palimpsest_core::similarity::textual_distance;
///
/// assert_eq!(textual_distance("Bring back the mammoth", "bring  back the MAMMOTH"), 0.0);
/// assert_eq!(textual_distance("aaaa", "bbbb"), 1.0);
/// assert_eq!(textual_distance("", ""), 0.0);
/// ```
pub fn textual_distance(a: &str, b: &str) -> f64 {
    let distance = 1.0 - jaccard_similarity(&shingles(a), &shingles(b));
    distance.clamp(0.0, 1.0)
}
