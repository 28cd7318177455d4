//! Keyword categories and phrase counting.
//!
//! A [`KeywordRegistry`] maps a category name to the trigger phrases that
//! signal it. The default registry codes the narrative of a de-extinction
//! company's site; any other mapping can be loaded from JSON.
//!
//! Counting is case-insensitive and phrase-bounded: an occurrence counts only
//! when the characters immediately before and after it are not word
//! characters. Every occurrence of every phrase counts, so overlapping phrases
//! ("climate" and "climate change") both contribute.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PalimpsestError, Result};

/// Per-category occurrence counts.
pub type KeywordCounts = BTreeMap<String, usize>;

/// Per-category signed count differences (later minus earlier).
pub type KeywordDeltas = BTreeMap<String, i64>;

/// Category name → trigger phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordRegistry {
    categories: BTreeMap<String, Vec<String>>,
}

impl KeywordRegistry {
    /// Builds a registry from `(category, phrases)` pairs.
    pub fn new<I, C, P>(categories: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<P>)>,
        C: Into<String>,
        P: Into<String>,
    {
        let categories = categories
            .into_iter()
            .map(|(name, phrases)| (name.into(), phrases.into_iter().map(Into::into).collect()))
            .collect();
        Self { categories }
    }

    /// Parses a JSON object of `"category": ["phrase", ...]`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Loads a JSON registry file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PalimpsestError::FileNotFound(path.to_path_buf()));
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Rejects registries that would match everywhere or nothing at all.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(PalimpsestError::ConfigError("keyword registry has no categories".to_string()));
        }
        for (name, phrases) in &self.categories {
            if name.trim().is_empty() {
                return Err(PalimpsestError::ConfigError("keyword category with empty name".to_string()));
            }
            if phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(PalimpsestError::ConfigError(format!(
                    "keyword category {:?} contains an empty phrase",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Category names in order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn phrases(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Counts every category's phrases in `text`.
    pub fn count(&self, text: &str) -> KeywordCounts {
        let haystack = text.to_lowercase();
        self.categories
            .iter()
            .map(|(name, phrases)| {
                let total = phrases.iter().map(|p| count_phrase(&haystack, &p.to_lowercase())).sum();
                (name.clone(), total)
            })
            .collect()
    }
}

impl Default for KeywordRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|(name, phrases)| (*name, phrases.to_vec())))
    }
}

/// `later - earlier` for every category present in either count.
pub fn keyword_deltas(earlier: &KeywordCounts, later: &KeywordCounts) -> KeywordDeltas {
    earlier
        .keys()
        .chain(later.keys())
        .map(|name| {
            let a = earlier.get(name).copied().unwrap_or(0) as i64;
            let b = later.get(name).copied().unwrap_or(0) as i64;
            (name.clone(), b - a)
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Non-overlapping, phrase-bounded occurrences of `phrase` in `haystack`.
fn count_phrase(haystack: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(phrase) {
        let start = from + offset;
        let end = start + phrase.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
            count += 1;
            from = end;
        } else {
            // a rejected candidate may still overlap a valid match further on
            from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    count
}

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "de_extinction",
        &[
            "de-extinction", "de extinction", "deextinction", "de-extinct", "extinct", "extinction", "revive",
            "reviving", "resurrection", "bring back", "restore", "restoration", "species recovery", "lost species",
            "vanished species",
        ],
    ),
    (
        "functional_de_extinction",
        &[
            "functional de-extinction", "functional extinction", "proxy", "proxy species", "surrogate",
            "ecological replacement", "ecological proxy", "functionally equivalent", "ecosystem function",
            "ecological role", "keystone species", "ecosystem engineer",
        ],
    ),
    (
        "climate_benefit",
        &[
            "climate", "climate change", "global warming", "carbon", "carbon capture", "carbon sequestration",
            "permafrost", "ecosystem", "biodiversity", "environment", "environmental", "warming", "arctic",
            "tundra", "grassland", "methane", "greenhouse gas", "emissions", "rewilding", "ecological restoration",
            "habitat restoration", "ecosystem services",
        ],
    ),
    (
        "conservation_alignment",
        &[
            "IUCN", "International Union for Conservation of Nature", "conservation status", "conservation",
            "conserve", "preserve", "protection", "endangered", "threatened", "vulnerable", "critically endangered",
            "red list", "wildlife conservation", "species protection", "habitat protection",
            "conservation biology", "WWF", "World Wildlife Fund", "Nature Conservancy",
        ],
    ),
    (
        "ethics_welfare",
        &[
            "welfare", "ethics", "ethical", "suffering", "well-being", "wellbeing", "humane", "animal rights",
            "bioethics", "moral", "morality", "compassion", "cruelty", "pain", "stress", "quality of life",
            "animal welfare", "ethical concerns", "moral implications", "responsible", "responsibility",
        ],
    ),
    (
        "indigenous_cultural",
        &[
            "indigenous", "iwi", "māori", "maori", "first nations", "tribal", "native peoples", "aboriginal",
            "traditional knowledge", "cultural heritage", "cultural significance", "sacred", "traditional lands",
            "ancestral", "community consent", "cultural impact", "traditional use", "spiritual significance",
            "cultural protocols",
        ],
    ),
    (
        "risk_caution",
        &[
            "risk", "risks", "caution", "concern", "concerns", "careful", "carefully", "safety", "safe",
            "precaution", "precautionary", "unintended consequences", "side effects", "unpredictable",
            "uncertainty", "unknown", "potential harm", "ecological risk", "biosafety", "containment", "monitoring",
        ],
    ),
    (
        "hype_breakthrough",
        &[
            "moonshot", "sci-fi", "science fiction", "hype", "breakthrough", "revolutionary", "groundbreaking",
            "cutting-edge", "pioneering", "first-of-its-kind", "game-changing", "transformative", "incredible",
            "amazing", "remarkable", "unprecedented", "historic", "milestone", "achievement", "success",
        ],
    ),
    (
        "technology_methods",
        &[
            "CRISPR", "CRISPR-Cas9", "gene editing", "genetic engineering", "biotechnology", "genomics", "DNA",
            "genome", "genetic", "genes", "sequencing", "genome sequencing", "ancient DNA", "aDNA", "paleogenomics",
            "bioinformatics", "synthetic biology", "genetic modification", "gene drive", "cloning",
            "somatic cell nuclear transfer", "embryo", "stem cells", "induced pluripotent stem cells", "iPSCs",
            "tissue engineering", "bioengineering",
        ],
    ),
    (
        "business_funding",
        &[
            "funding", "investment", "million", "billion", "venture", "venture capital", "VC", "capital",
            "investors", "investor", "raise", "raised", "round", "Series A", "Series B", "seed funding",
            "valuation", "IPO", "public offering", "revenue", "profit", "commercial", "commercialization", "market",
            "business model", "partnership", "collaboration", "deal",
        ],
    ),
    (
        "timeline_claims",
        &[
            "years", "year", "decade", "decades", "timeline", "timeframe", "when", "soon", "near-term", "long-term",
            "future", "next", "within", "by", "2025", "2026", "2027", "2028", "2029", "2030", "2031", "2032", "2033",
            "2034", "2035", "first", "initial", "eventually", "ultimately", "phase", "stage", "milestone", "target",
            "goal", "expect", "plan", "project", "estimate",
        ],
    ),
    (
        "regulatory_legal",
        &[
            "regulation", "regulatory", "approval", "permit", "license", "FDA", "USDA", "EPA", "government",
            "oversight", "compliance", "legal", "law", "legislation", "policy", "guidelines", "standards",
            "framework", "authority", "agency", "review", "assessment", "evaluation", "authorize", "authorized",
        ],
    ),
    (
        "target_species",
        &[
            "mammoth", "woolly mammoth", "thylacine", "tasmanian tiger", "dodo", "dodo bird", "passenger pigeon",
            "dire wolf", "saber-tooth", "sabre-tooth", "quagga", "aurochs", "carolina parakeet", "great auk", "moa",
            "elephant bird", "giant ground sloth", "cave bear", "irish elk", "short-faced bear", "american chestnut",
            "heath hen", "pyrenean ibex", "bucardo", "northern white rhino", "vaquita", "amur leopard",
            "javan rhino", "cross river gorilla",
        ],
    ),
    (
        "scientific_validation",
        &[
            "peer review", "peer-reviewed", "publication", "published", "study", "research", "science",
            "scientific", "evidence", "data", "results", "findings", "analysis", "experiment", "trial", "test",
            "validation", "verify", "proof", "demonstrate", "show", "confirm", "journal", "Nature", "Science",
            "Cell", "PNAS", "reproducible", "replication", "methodology", "protocol",
        ],
    ),
    (
        "opposition_criticism",
        &[
            "criticism", "critics", "oppose", "opposition", "against", "debate", "controversy", "controversial",
            "dispute", "question", "doubt", "skeptical", "skepticism", "concern", "worry", "problem", "issue",
            "challenge", "difficult", "impossible", "unrealistic", "fantasy", "playing god", "unnatural", "wrong",
            "misguided", "waste", "distraction", "false hope",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_hyphenated_and_spaced_forms_both_count() {
        let registry = KeywordRegistry::default();
        let counts = registry.count("de-extinction is not the same as de extinction");
        // "de-extinction", "de extinction", and "extinction" twice
        assert!(counts["de_extinction"] >= 2);
        assert_eq!(counts["de_extinction"], 4);
    }

    #[rstest]
    #[case("Climate change matters", 2)]
    #[case("CLIMATE", 1)]
    #[case("climatechange", 0)]
    #[case("paleoclimate", 0)]
    #[case("climate, climate; climate.", 3)]
    #[case("", 0)]
    fn test_climate_counts(#[case] text: &str, #[case] expected: usize) {
        let registry = KeywordRegistry::new([("climate", vec!["climate", "climate change"])]);
        assert_eq!(registry.count(text)["climate"], expected);
    }

    #[rstest]
    #[case("xla la la", 1)]
    #[case("la la la la", 2)]
    #[case("lala la la", 1)]
    fn test_rejected_match_does_not_hide_next(#[case] text: &str, #[case] expected: usize) {
        let registry = KeywordRegistry::new([("refrain", vec!["la la"])]);
        assert_eq!(registry.count(text)["refrain"], expected);
    }

    #[test]
    fn test_word_boundaries_are_unicode_aware() {
        let registry = KeywordRegistry::new([("people", vec!["māori", "iwi"])]);
        assert_eq!(registry.count("Māori iwi; kiwi").get("people"), Some(&2));
        assert_eq!(registry.count("Māoridom").get("people"), Some(&0));
    }

    #[test]
    fn test_case_insensitive_phrases() {
        let registry = KeywordRegistry::new([("tech", vec!["CRISPR", "aDNA"])]);
        assert_eq!(registry.count("crispr and ADNA and Crispr-based").get("tech"), Some(&3));
    }

    #[test]
    fn test_every_category_reported() {
        let registry = KeywordRegistry::default();
        let counts = registry.count("nothing relevant");
        assert_eq!(counts.len(), registry.len());
        assert_eq!(registry.len(), 15);
    }

    #[test]
    fn test_keyword_deltas() {
        let a: KeywordCounts = [("x".to_string(), 3), ("y".to_string(), 1)].into_iter().collect();
        let b: KeywordCounts = [("x".to_string(), 1), ("z".to_string(), 2)].into_iter().collect();
        let deltas = keyword_deltas(&a, &b);
        assert_eq!(deltas["x"], -2);
        assert_eq!(deltas["y"], -1);
        assert_eq!(deltas["z"], 2);
    }

    #[test]
    fn test_from_json() {
        let registry = KeywordRegistry::from_json_str(r#"{"hype": ["moonshot", "breakthrough"]}"#).unwrap();
        assert_eq!(registry.phrases("hype").unwrap().len(), 2);
        assert_eq!(registry.count("A moonshot breakthrough")["hype"], 2);
    }

    #[test]
    fn test_from_json_rejects_empty_phrase() {
        let err = KeywordRegistry::from_json_str(r#"{"hype": [""]}"#).unwrap_err();
        assert!(matches!(err, PalimpsestError::ConfigError(_)));
        assert!(KeywordRegistry::from_json_str("{}").is_err());
        assert!(KeywordRegistry::from_json_str("[1, 2]").is_err());
    }
}
