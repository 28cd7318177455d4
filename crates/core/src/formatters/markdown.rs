use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::analyze::{AnalysisSummary, DiffRecord, TOP_CHANGES};

/// Configuration for the Markdown change log
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Distance threshold the significant changes were selected with
    pub threshold: f64,
    /// Timestamp printed under the title
    pub generated_at: Option<DateTime<FixedOffset>>,
    /// Include the diff excerpt of every change
    pub include_excerpts: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { threshold: 0.05, generated_at: None, include_excerpts: true }
    }
}

/// Render the change log for a set of significant changes.
pub fn convert_to_markdown(significant: &[DiffRecord], config: &MarkdownConfig) -> String {
    let mut md: Vec<String> = Vec::new();

    md.push("# Site Evolution Change Log\n".to_string());
    if let Some(at) = config.generated_at {
        md.push(format!("_Generated: {}_\n", at.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    md.push(format!("\n**Threshold for significant change:** distance ≥ {}\n", config.threshold));

    let summary = AnalysisSummary::new(significant, significant, config.threshold);
    if let Some(stats) = &summary.magnitude {
        md.push("\n## Change Magnitude Analysis\n".to_string());
        md.push(format!("- **Average magnitude score:** {:.3}", stats.average));
        md.push(format!("- **Maximum magnitude score:** {:.3}", stats.maximum));
        md.push("- **Change categories:**".to_string());
        for c in &stats.categories {
            md.push(format!("  - {}: {} changes ({:.1}%)", c.category, c.count, c.percent));
        }

        md.push(format!("\n### Top {} Highest Magnitude Changes", TOP_CHANGES));
        for change in &summary.top_by_magnitude {
            md.push(format!(
                "- **{}** ({} → {}): Magnitude {:.3} ({})",
                change.slug, change.from_ts, change.to_ts, change.magnitude_score, change.change_category
            ));
        }
    }

    md.push("\n## Detailed Change Log\n".to_string());

    let mut ordered: Vec<&DiffRecord> = significant.iter().collect();
    ordered.sort_by(|a, b| a.slug.cmp(&b.slug).then_with(|| a.from_ts.cmp(&b.from_ts)));

    for r in ordered {
        md.extend(change_section(r, config));
    }

    md.join("\n")
}

fn change_section(r: &DiffRecord, config: &MarkdownConfig) -> Vec<String> {
    let mut lines = vec![
        format!(
            "\n## {}: {} → {} (distance {:.4}) **{}** (magnitude: {:.3})",
            r.slug, r.from_ts, r.to_ts, r.distance, r.scores.change_category, r.scores.magnitude_score
        ),
        format!("- From: {}", r.from_url),
        format!("- To:   {}", r.to_url),
        "- **Change Metrics:**".to_string(),
        format!("  - Similarity complement: {:.3}", r.scores.similarity_complement),
        format!("  - Character change ratio: {:.3}", r.scores.char_change_ratio),
        format!("  - Diff density: {:.3}", r.scores.diff_density),
        format!("  - Keyword intensity: {:.3}", r.scores.keyword_intensity),
        format!("  - Structural changes: {:.3}", r.scores.structural_score),
    ];

    let mut deltas: Vec<(&String, &i64)> = r.keyword_deltas.iter().collect();
    // stable sort keeps category order among equal magnitudes
    deltas.sort_by(|a, b| b.1.unsigned_abs().cmp(&a.1.unsigned_abs()));
    if !deltas.is_empty() {
        let top: Vec<String> = deltas.iter().take(TOP_CHANGES).map(|(k, v)| format!("{}:{:+}", k, v)).collect();
        lines.push(format!("- **Top keyword deltas:** {}", top.join(", ")));
    }

    lines.push(format!("- **Taglines:** {}", r.taglines.details()));

    if config.include_excerpts {
        lines.push(format!("\n<details><summary>Diff excerpt</summary>\n\n```\n{}\n```\n</details>\n", r.diff_excerpt));
    }

    lines
}

/// Markdown formatter with configurable options
pub struct MarkdownFormatter {
    config: MarkdownConfig,
}

impl MarkdownFormatter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, significant: &[DiffRecord]) -> String {
        convert_to_markdown(significant, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Analyzer;
    use crate::analyze::tests::snapshot;

    fn significant() -> Vec<DiffRecord> {
        Analyzer::default()
            .analyze(&[
                snapshot("home", "20210115093000", "[H1] Bring back the mammoth"),
                snapshot("home", "20220115093000", "[H1] Reviving the mammoth ecosystem"),
                snapshot("about", "20210101000000", "[P_0] Our scientists study ancient DNA"),
                snapshot("about", "20230101000000", "[P_0] A moonshot company with funding"),
            ])
            .significant(0.05)
    }

    #[test]
    fn test_change_log_contents() {
        let generated_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00+02:00").unwrap();
        let config = MarkdownConfig { threshold: 0.05, generated_at: Some(generated_at), include_excerpts: true };
        let md = convert_to_markdown(&significant(), &config);

        assert!(md.starts_with("# Site Evolution Change Log"));
        assert!(md.contains("_Generated: 2024-05-01T12:00:00+02:00_"));
        assert!(md.contains("distance ≥ 0.05"));
        assert!(md.contains("## Change Magnitude Analysis"));
        assert!(md.contains("- **Average magnitude score:**"));
        assert!(md.contains("### Top 5 Highest Magnitude Changes"));
        assert!(md.contains("- From: https://web.archive.org/web/20210115093000/"));
        assert!(md.contains("  - Similarity complement: "));
        assert!(md.contains("climate_benefit:+1"));
        assert!(md.contains("- **Taglines:** No taglines found"));
        assert!(md.contains("<details><summary>Diff excerpt</summary>"));
        assert!(md.contains("+[H1] Reviving the mammoth ecosystem"));
    }

    #[test]
    fn test_changes_sorted_by_slug_then_time() {
        let md = convert_to_markdown(&significant(), &MarkdownConfig::default());
        let about = md.find("\n## about: ").unwrap();
        let home = md.find("\n## home: ").unwrap();
        assert!(about < home);
    }

    #[test]
    fn test_empty_change_log() {
        let md = MarkdownFormatter::new(MarkdownConfig::default()).convert(&[]);
        assert!(md.contains("## Detailed Change Log"));
        assert!(!md.contains("## Change Magnitude Analysis"));
        assert!(!md.contains("_Generated"));
    }

    #[test]
    fn test_excerpts_can_be_omitted() {
        let config = MarkdownConfig { include_excerpts: false, ..Default::default() };
        let md = convert_to_markdown(&significant(), &config);
        assert!(!md.contains("<details>"));
    }
}
