use crate::Result;
use crate::analyze::AnalysisSummary;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Convert an analysis summary to JSON
pub fn summary_to_json(summary: &AnalysisSummary, config: &JsonConfig) -> Result<String> {
    if config.pretty { Ok(serde_json::to_string_pretty(summary)?) } else { Ok(serde_json::to_string(summary)?) }
}

/// JSON formatter for analysis summaries
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, summary: &AnalysisSummary) -> Result<String> {
        summary_to_json(summary, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Analyzer;
    use crate::analyze::tests::snapshot;

    #[test]
    fn test_summary_to_json() {
        let analysis = Analyzer::default().analyze(&[
            snapshot("home", "20210115093000", "[H1] Bring back the mammoth"),
            snapshot("home", "20220115093000", "[H1] Reviving the mammoth ecosystem"),
        ]);
        let json = summary_to_json(&analysis.summary(0.05), &JsonConfig { pretty: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_comparisons"], 1);
        assert_eq!(value["significant_changes"], 1);
        assert_eq!(value["changes_by_slug"][0]["slug"], "home");
        assert_eq!(value["top_by_distance"][0]["from_ts"], "20210115093000");
        assert!(value["magnitude"]["average"].as_f64().is_some());
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_compact_json_without_changes() {
        let analysis = Analyzer::default().analyze(&[]);
        let json = JsonFormatter::new(JsonConfig::default()).convert(&analysis.summary(0.05)).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"magnitude\":null"));
    }
}
