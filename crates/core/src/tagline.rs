//! Brand taglines: short texts at fixed markup locations.
//!
//! Taglines are pulled from the raw (unpreprocessed) markup of a capture and
//! compared identifier by identifier between consecutive captures.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Taglines;
use crate::parse::Document;

/// CSS selectors whose text is treated as a tagline.
pub const TAGLINE_SELECTORS: &[&str] = &["h1", ".hero h1", ".hero h2", ".banner h1", ".tagline", ".slogan"];

/// `<meta>` lookups treated as taglines: (attribute, value, identifier).
const META_TAGLINES: &[(&str, &str, &str)] = &[
    ("name", "description", "meta_description"),
    ("property", "og:description", "og_description"),
];

const MAX_TAGLINE_CHARS: usize = 500;

/// Extracts the tagline mapping of one capture.
///
/// The first match of a selector is keyed by the selector itself, later
/// matches by `selector_i`. Texts of 500 characters or more are ignored.
pub fn extract_taglines(html: &str) -> Taglines {
    let doc = Document::parse(html);
    let mut taglines = Taglines::new();

    for selector in TAGLINE_SELECTORS {
        for (i, el) in doc.select_or_empty(selector).iter().enumerate() {
            let text = el.stripped_text("");
            if is_tagline(&text) {
                let key = if i > 0 { format!("{}_{}", selector, i) } else { selector.to_string() };
                taglines.insert(key, text);
            }
        }
    }

    for (attribute, value, key) in META_TAGLINES {
        if let Some(text) = doc.meta_content(attribute, value)
            && is_tagline(&text)
        {
            taglines.insert(key.to_string(), text);
        }
    }

    taglines
}

fn is_tagline(text: &str) -> bool {
    !text.is_empty() && text.chars().count() < MAX_TAGLINE_CHARS
}

/// How one tagline identifier differs between two captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaglineChange {
    Added { key: String, text: String },
    Removed { key: String, text: String },
    Changed { key: String, from: String, to: String },
}

impl TaglineChange {
    fn describe(&self) -> String {
        match self {
            TaglineChange::Added { key, text } => format!("Added {}: '{}...'", key, preview(text, 50)),
            TaglineChange::Removed { key, text } => format!("Removed {}: '{}...'", key, preview(text, 50)),
            TaglineChange::Changed { key, from, to } => {
                format!("Changed {}: '{}...' -> '{}...'", key, preview(from, 30), preview(to, 30))
            }
        }
    }
}

/// Tagline differences between an earlier and a later capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaglineComparison {
    /// Changes ordered by identifier.
    pub changes: Vec<TaglineChange>,
    /// Neither capture had any tagline.
    pub both_empty: bool,
}

impl TaglineComparison {
    /// Number of identifiers whose text differs.
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// One-line human summary.
    pub fn details(&self) -> String {
        if self.both_empty {
            "No taglines found".to_string()
        } else if self.changes.is_empty() {
            "No changes".to_string()
        } else {
            self.changes.iter().map(TaglineChange::describe).collect::<Vec<_>>().join("; ")
        }
    }
}

/// Compares the tagline mappings of an earlier (`a`) and later (`b`) capture.
pub fn compare_taglines(a: &Taglines, b: &Taglines) -> TaglineComparison {
    if a.is_empty() && b.is_empty() {
        return TaglineComparison { changes: Vec::new(), both_empty: true };
    }

    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    let changes = keys
        .into_iter()
        .filter_map(|key| match (a.get(key), b.get(key)) {
            (Some(text), None) => Some(TaglineChange::Removed { key: key.clone(), text: text.clone() }),
            (None, Some(text)) => Some(TaglineChange::Added { key: key.clone(), text: text.clone() }),
            (Some(from), Some(to)) if from != to => {
                Some(TaglineChange::Changed { key: key.clone(), from: from.clone(), to: to.clone() })
            }
            _ => None,
        })
        .collect();

    TaglineComparison { changes, both_empty: false }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
