//! Change magnitude scoring.
//!
//! Five independent indicators, each clamped to `[0, 1]`, are combined into a
//! single weighted score and bucketed into a [`ChangeCategory`]. The default
//! weights and the keyword baseline are a heuristic carried over for
//! comparability across runs, not a fitted model; both are tunable through
//! [`MagnitudeWeights`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::UnifiedDiff;
use crate::keywords::KeywordDeltas;
use crate::{PalimpsestError, Result};

/// Weights of the five indicators plus the keyword-intensity smoothing
/// baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeWeights {
    pub similarity: f64,
    pub char_change: f64,
    pub diff_density: f64,
    pub keyword_intensity: f64,
    pub structural: f64,
    /// Added to the keyword delta total in the intensity denominator.
    pub keyword_baseline: f64,
}

impl Default for MagnitudeWeights {
    fn default() -> Self {
        Self {
            similarity: 0.30,
            char_change: 0.20,
            diff_density: 0.25,
            keyword_intensity: 0.15,
            structural: 0.10,
            keyword_baseline: 10.0,
        }
    }
}

impl MagnitudeWeights {
    fn weights(&self) -> [f64; 5] {
        [self.similarity, self.char_change, self.diff_density, self.keyword_intensity, self.structural]
    }

    /// Rejects negative or all-zero weights and a non-positive baseline.
    pub fn validate(&self) -> Result<()> {
        let weights = self.weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PalimpsestError::ConfigError("magnitude weights must be finite and non-negative".to_string()));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(PalimpsestError::ConfigError("magnitude weights must not all be zero".to_string()));
        }
        if !self.keyword_baseline.is_finite() || self.keyword_baseline <= 0.0 {
            return Err(PalimpsestError::ConfigError("keyword baseline must be positive".to_string()));
        }
        Ok(())
    }
}

/// Human-readable magnitude band. Each band includes its lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeCategory {
    Minimal,
    Minor,
    Moderate,
    Substantial,
    Major,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 5] = [
        ChangeCategory::Major,
        ChangeCategory::Substantial,
        ChangeCategory::Moderate,
        ChangeCategory::Minor,
        ChangeCategory::Minimal,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ChangeCategory::Major
        } else if score >= 0.6 {
            ChangeCategory::Substantial
        } else if score >= 0.4 {
            ChangeCategory::Moderate
        } else if score >= 0.2 {
            ChangeCategory::Minor
        } else {
            ChangeCategory::Minimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::Major => "Major",
            ChangeCategory::Substantial => "Substantial",
            ChangeCategory::Moderate => "Moderate",
            ChangeCategory::Minor => "Minor",
            ChangeCategory::Minimal => "Minimal",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five indicators and their combination for one pair of captures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeScores {
    /// Complement of shingle similarity, i.e. the textual distance.
    pub similarity_complement: f64,
    pub char_change_ratio: f64,
    pub diff_density: f64,
    pub keyword_intensity: f64,
    pub structural_score: f64,
    pub magnitude_score: f64,
    pub change_category: ChangeCategory,
}

/// Inputs to the magnitude computation for one (earlier, later) pair.
#[derive(Debug, Clone, Copy)]
pub struct PairMetrics<'a> {
    /// Cleaned earlier text.
    pub old: &'a str,
    /// Cleaned later text.
    pub new: &'a str,
    pub distance: f64,
    pub diff: &'a UnifiedDiff,
    pub keyword_deltas: &'a KeywordDeltas,
}

/// Scores one pair of captures.
pub fn score(pair: &PairMetrics<'_>, weights: &MagnitudeWeights) -> MagnitudeScores {
    let len_a = pair.old.chars().count() as f64;
    let len_b = pair.new.chars().count() as f64;
    let lines_a = pair.old.lines().count();
    let lines_b = pair.new.lines().count();
    let changed = pair.diff.changed_lines() as f64;

    let similarity_complement = clamp_unit(pair.distance);

    let avg_len = if len_a + len_b > 0.0 { (len_a + len_b) / 2.0 } else { 1.0 };
    let char_change_ratio = clamp_unit((len_b - len_a).abs() / avg_len);

    let diff_density = clamp_unit(changed / (lines_a + lines_b).max(1) as f64);

    let keyword_total: f64 = pair.keyword_deltas.values().map(|d| d.unsigned_abs() as f64).sum();
    let keyword_intensity = clamp_unit(keyword_total / (keyword_total + weights.keyword_baseline));

    let structural_score = clamp_unit(changed / lines_a.max(lines_b).max(1) as f64);

    let indicators = [similarity_complement, char_change_ratio, diff_density, keyword_intensity, structural_score];
    let magnitude_score = indicators.iter().zip(weights.weights()).map(|(value, weight)| value * weight).sum::<f64>();

    MagnitudeScores {
        similarity_complement,
        char_change_ratio,
        diff_density,
        keyword_intensity,
        structural_score,
        magnitude_score,
        change_category: ChangeCategory::from_score(magnitude_score),
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::textual_distance;
    use rstest::rstest;

    fn score_texts(old: &str, new: &str, deltas: &KeywordDeltas) -> MagnitudeScores {
        let diff = UnifiedDiff::compute(old, new, "a", "b");
        let pair = PairMetrics { old, new, distance: textual_distance(old, new), diff: &diff, keyword_deltas: deltas };
        score(&pair, &MagnitudeWeights::default())
    }

    #[rstest]
    #[case(1.0, ChangeCategory::Major)]
    #[case(0.8, ChangeCategory::Major)]
    #[case(0.7999, ChangeCategory::Substantial)]
    #[case(0.6, ChangeCategory::Substantial)]
    #[case(0.4, ChangeCategory::Moderate)]
    #[case(0.3999, ChangeCategory::Minor)]
    #[case(0.2, ChangeCategory::Minor)]
    #[case(0.1999, ChangeCategory::Minimal)]
    #[case(0.0, ChangeCategory::Minimal)]
    fn test_category_boundaries(#[case] score: f64, #[case] expected: ChangeCategory) {
        assert_eq!(ChangeCategory::from_score(score), expected);
    }

    #[test]
    fn test_identical_texts_score_zero() {
        let text = "[H1] Bring back the mammoth\n\n[P_0] Colossal is a de-extinction company.";
        let scores = score_texts(text, text, &KeywordDeltas::new());
        assert_eq!(scores.magnitude_score, 0.0);
        assert_eq!(scores.change_category, ChangeCategory::Minimal);
    }

    #[test]
    fn test_disjoint_texts_have_full_similarity_complement() {
        let scores = score_texts("abcdef", "uvwxyz", &KeywordDeltas::new());
        assert_eq!(scores.similarity_complement, 1.0);
        assert_eq!(scores.char_change_ratio, 0.0);
        assert_eq!(scores.diff_density, 1.0);
        assert_eq!(scores.structural_score, 1.0);
        assert!((scores.magnitude_score - 0.65).abs() < 1e-9);
        assert_eq!(scores.change_category, ChangeCategory::Substantial);
    }

    #[test]
    fn test_keyword_intensity_saturates_softly() {
        let deltas: KeywordDeltas = [("a".to_string(), 5), ("b".to_string(), -5)].into_iter().collect();
        let scores = score_texts("same", "same", &deltas);
        assert!((scores.keyword_intensity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_char_change_ratio_is_capped() {
        let scores = score_texts("", "a whole new page appeared", &KeywordDeltas::new());
        assert_eq!(scores.char_change_ratio, 1.0);
        assert!(scores.magnitude_score <= 1.0);
    }

    #[test]
    fn test_custom_weights() {
        let weights = MagnitudeWeights {
            similarity: 1.0,
            char_change: 0.0,
            diff_density: 0.0,
            keyword_intensity: 0.0,
            structural: 0.0,
            keyword_baseline: 10.0,
        };
        let diff = UnifiedDiff::compute("abcd", "abce", "a", "b");
        let deltas = KeywordDeltas::new();
        let pair = PairMetrics { old: "abcd", new: "abce", distance: 0.5, diff: &diff, keyword_deltas: &deltas };
        assert_eq!(score(&pair, &weights).magnitude_score, 0.5);
    }

    #[test]
    fn test_weight_validation() {
        assert!(MagnitudeWeights::default().validate().is_ok());
        let negative = MagnitudeWeights { similarity: -0.1, ..Default::default() };
        assert!(negative.validate().is_err());
        let zero = MagnitudeWeights {
            similarity: 0.0,
            char_change: 0.0,
            diff_density: 0.0,
            keyword_intensity: 0.0,
            structural: 0.0,
            keyword_baseline: 10.0,
        };
        assert!(zero.validate().is_err());
        let baseline = MagnitudeWeights { keyword_baseline: 0.0, ..Default::default() };
        assert!(baseline.validate().is_err());
    }
}
