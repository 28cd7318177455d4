//! Line-level unified diffs between consecutive captures.
//!
//! The full diff drives the structural metrics; the [`UnifiedDiff::excerpt`]
//! is the bounded, human-readable part kept in reports.

use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};

/// Unchanged lines shown around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Maximum number of lines kept in an excerpt.
pub const MAX_EXCERPT_LINES: usize = 300;

/// Added/removed lines whose trimmed content is this short or shorter are
/// dropped from the excerpt.
const TRIVIAL_CHANGE_CHARS: usize = 5;

/// A unified diff in the classic `---`/`+++`/`@@` layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    /// Every output line, headers included, without trailing newlines.
    pub lines: Vec<String>,
    /// Count of `+` content lines.
    pub added: usize,
    /// Count of `-` content lines.
    pub removed: usize,
}

impl UnifiedDiff {
    /// Diffs `old` against `new` line by line, labelling the file headers
    /// with `from_label` and `to_label`. Identical inputs yield an empty diff.
    pub fn compute(old: &str, new: &str, from_label: &str, to_label: &str) -> Self {
        let old_lines: Vec<&str> = old.lines().collect();
        let new_lines: Vec<&str> = new.lines().collect();

        let diff = TextDiff::configure().algorithm(Algorithm::Myers).diff_slices(&old_lines, &new_lines);

        let groups: Vec<Vec<DiffOp>> = diff
            .grouped_ops(CONTEXT_LINES)
            .into_iter()
            .filter(|group| group.iter().any(|op| !matches!(op, DiffOp::Equal { .. })))
            .collect();

        let mut out = Self::default();
        if groups.is_empty() {
            return out;
        }

        out.lines.push(format!("--- {}", from_label));
        out.lines.push(format!("+++ {}", to_label));

        for group in &groups {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };
            out.lines.push(format!(
                "@@ -{} +{} @@",
                hunk_range(first.old_range().start, last.old_range().end),
                hunk_range(first.new_range().start, last.new_range().end),
            ));

            for op in group {
                for change in diff.iter_changes(op) {
                    let line = change.value();
                    match change.tag() {
                        ChangeTag::Equal => out.lines.push(format!(" {}", line)),
                        ChangeTag::Delete => {
                            out.removed += 1;
                            out.lines.push(format!("-{}", line));
                        }
                        ChangeTag::Insert => {
                            out.added += 1;
                            out.lines.push(format!("+{}", line));
                        }
                    }
                }
            }
        }

        out
    }

    /// Added plus removed content lines.
    pub fn changed_lines(&self) -> usize {
        self.added + self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The meaningful excerpt: headers and context lines are kept, changed
    /// lines only when their content is longer than five characters, capped
    /// at [`MAX_EXCERPT_LINES`] lines and joined with newlines.
    pub fn excerpt(&self) -> String {
        self.lines
            .iter()
            .filter(|line| is_meaningful(line))
            .take(MAX_EXCERPT_LINES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_meaningful(line: &str) -> bool {
    if line.starts_with("---") || line.starts_with("+++") || line.starts_with("@@") || line.starts_with(' ') {
        return true;
    }
    match line.strip_prefix(['+', '-']) {
        Some(content) => content.trim().chars().count() > TRIVIAL_CHANGE_CHARS,
        None => false,
    }
}

/// Formats a half-open line range as a 1-based unified-diff range.
fn hunk_range(start: usize, end: usize) -> String {
    let length = end - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_produce_empty_diff() {
        let diff = UnifiedDiff::compute("a\nb\nc", "a\nb\nc", "x@1", "x@2");
        assert!(diff.is_empty());
        assert_eq!(diff.changed_lines(), 0);
        assert_eq!(diff.excerpt(), "");
    }

    #[test]
    fn test_single_line_replacement() {
        let diff = UnifiedDiff::compute(
            "[H1] Bring back the mammoth",
            "[H1] Reviving the mammoth ecosystem",
            "home@20210101000000",
            "home@20220101000000",
        );
        assert_eq!(
            diff.lines,
            vec![
                "--- home@20210101000000",
                "+++ home@20220101000000",
                "@@ -1 +1 @@",
                "-[H1] Bring back the mammoth",
                "+[H1] Reviving the mammoth ecosystem",
            ]
        );
        assert_eq!(diff.added, 1);
        assert_eq!(diff.removed, 1);
    }

    #[test]
    fn test_context_window_and_ranges() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9";
        let new = "1\n2\n3\n4\nfive\n6\n7\n8\n9";
        let diff = UnifiedDiff::compute(old, new, "a", "b");
        assert_eq!(diff.lines[2], "@@ -2,7 +2,7 @@");
        assert_eq!(diff.lines[3], " 2");
        assert_eq!(diff.lines.last().map(String::as_str), Some(" 8"));
        assert_eq!(diff.changed_lines(), 2);
    }

    #[test]
    fn test_insertion_into_empty() {
        let diff = UnifiedDiff::compute("", "new line here", "a", "b");
        assert_eq!(diff.lines[2], "@@ -0,0 +1 @@");
        assert_eq!(diff.added, 1);
        assert_eq!(diff.removed, 0);
    }

    #[test]
    fn test_excerpt_drops_trivial_changes() {
        let diff = UnifiedDiff::compute("keep me\nabc\nold substantive line", "keep me\nxyz\nnew substantive line", "a", "b");
        let excerpt = diff.excerpt();
        assert!(excerpt.contains("--- a"));
        assert!(excerpt.contains(" keep me"));
        assert!(excerpt.contains("-old substantive line"));
        assert!(excerpt.contains("+new substantive line"));
        assert!(!excerpt.contains("-abc"));
        assert!(!excerpt.contains("+xyz"));
        assert_eq!(diff.changed_lines(), 4);
    }

    #[test]
    fn test_excerpt_is_capped() {
        let old: Vec<String> = (0..400).map(|i| format!("original line number {}", i)).collect();
        let new: Vec<String> = (0..400).map(|i| format!("rewritten line number {}", i)).collect();
        let diff = UnifiedDiff::compute(&old.join("\n"), &new.join("\n"), "a", "b");
        assert_eq!(diff.changed_lines(), 800);
        assert_eq!(diff.excerpt().lines().count(), MAX_EXCERPT_LINES);
    }
}
