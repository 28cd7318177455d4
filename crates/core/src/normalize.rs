//! Markup-to-text normalization.
//!
//! Archived pages are turned into one plain-text document in which every
//! fragment carries a structural marker (`[TITLE]`, `[H2_3]`, `[P_7]`,
//! `[UL_0_ITEM_2]`, ...). Markers keep line-level diffs between captures
//! aligned on page structure instead of raw layout.
//!
//! Fragments are emitted section by section in a fixed order (metadata,
//! navigation, headers, headings by level, main content, paragraphs, lists,
//! tables, quotes, images, links, footers, text-only divs); inside a section
//! elements follow document order. The output is a pure function of the
//! input markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::{Document, Element};
use crate::preprocess::PreprocessConfig;

/// Marker prefix of the line that records where a capture was fetched from.
pub const SOURCE_MARKER: &str = "[SOURCE]";

const MAIN_SELECTORS: &[&str] = &["main", "[role='main']", ".main-content", ".content"];

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static LINE_EDGES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());

/// Converts one capture's raw markup into marker-annotated plain text.
///
/// `source_url` is recorded on the first line as `[SOURCE] <url>`; the
/// analyzer strips that line again before comparing captures.
///
/// ```rust
/// use palimpsest_core::html_to_text;
///
/// let html = "<html><head><title>Colossal</title></head><body><h1>Bring back the mammoth</h1></body></html>";
/// let text = html_to_text("https://web.archive.org/web/2021/https://colossal.com/", html);
/// assert_eq!(
///     text,
///     "[SOURCE] https://web.archive.org/web/2021/https://colossal.com/\n\n\
///      [TITLE] Colossal\n\n[CONTENT_START]\n\n[H1] Bring back the mammoth"
/// );
/// ```
pub fn html_to_text(source_url: &str, html: &str) -> String {
    let doc = Document::parse_with_preprocessing(html, &PreprocessConfig::default());

    let metadata = metadata_lines(&doc);
    let mut lines = Vec::with_capacity(metadata.len() + 64);

    lines.push(format!("{} {}", SOURCE_MARKER, source_url));
    if !metadata.is_empty() {
        lines.extend(metadata);
        lines.push("[CONTENT_START]".to_string());
    }

    extract_landmarks(&doc, &mut lines);
    extract_headings(&doc, &mut lines);
    extract_main_content(&doc, &mut lines);
    extract_paragraphs(&doc, &mut lines);
    extract_lists(&doc, &mut lines);
    extract_tables(&doc, &mut lines);
    extract_quotes(&doc, &mut lines);
    extract_images(&doc, &mut lines);
    extract_links(&doc, &mut lines);
    extract_footers(&doc, &mut lines);
    extract_text_divs(&doc, &mut lines);

    normalize_whitespace(&lines.join("\n\n"))
}

/// Collapses horizontal whitespace runs, limits blank-line runs to one blank
/// line, and trims spaces around line breaks and at both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let text = HORIZONTAL_WS.replace_all(text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = LINE_EDGES.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Removes `[SOURCE]` lines, which differ between captures only by fetch URL.
pub fn strip_source_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(SOURCE_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn metadata_lines(doc: &Document) -> Vec<String> {
    let mut lines = Vec::new();

    let title = doc.title().map(|t| t.trim().to_string()).unwrap_or_default();
    if !title.is_empty() {
        lines.push(format!("[TITLE] {}", title));
    }
    if let Some(desc) = doc.meta_content("name", "description") {
        lines.push(format!("[META_DESC] {}", desc));
    }
    if let Some(desc) = doc.meta_content("property", "og:description") {
        lines.push(format!("[OG_DESC] {}", desc));
    }
    if let Some(og_title) = doc.meta_content("property", "og:title")
        && og_title != title
    {
        lines.push(format!("[OG_TITLE] {}", og_title));
    }
    if let Some(keywords) = doc.meta_content("name", "keywords") {
        lines.push(format!("[KEYWORDS] {}", keywords));
    }

    lines
}

/// Pushes `[{label}_{i}] text` for every `tag` element whose text is longer than `min_len`.
fn push_labelled(doc: &Document, tag: &str, label: &str, min_len: usize, lines: &mut Vec<String>) {
    for (i, el) in doc.select_or_empty(tag).iter().enumerate() {
        let text = el.stripped_text(" ");
        if char_len(&text) > min_len {
            lines.push(format!("[{}_{}] {}", label, i, text));
        }
    }
}

fn extract_landmarks(doc: &Document, lines: &mut Vec<String>) {
    push_labelled(doc, "nav", "NAV", 10, lines);
    push_labelled(doc, "header", "HEADER", 10, lines);
}

fn extract_footers(doc: &Document, lines: &mut Vec<String>) {
    push_labelled(doc, "footer", "FOOTER", 20, lines);
}

fn extract_paragraphs(doc: &Document, lines: &mut Vec<String>) {
    push_labelled(doc, "p", "P", 20, lines);
}

fn extract_quotes(doc: &Document, lines: &mut Vec<String>) {
    push_labelled(doc, "blockquote", "QUOTE", 0, lines);
}

fn extract_headings(doc: &Document, lines: &mut Vec<String>) {
    for level in 1..=6 {
        for (i, heading) in doc.select_or_empty(&format!("h{}", level)).iter().enumerate() {
            let text = heading.stripped_text(" ");
            if !text.is_empty() {
                lines.push(format!("[H{}{}] {}", level, suffix(i), text));
            }
        }
    }
}

fn extract_main_content(doc: &Document, lines: &mut Vec<String>) {
    for selector in MAIN_SELECTORS {
        for (i, el) in doc.select_or_empty(selector).iter().enumerate() {
            let text = el.stripped_text(" ");
            if char_len(&text) > 50 {
                lines.push(format!("[MAIN_CONTENT{}] {}", suffix(i), text));
                break;
            }
        }
    }
}

fn extract_lists(doc: &Document, lines: &mut Vec<String>) {
    for (i, list) in doc.select_or_empty("ul, ol").iter().enumerate() {
        let items = list.select_or_empty("li");
        if items.is_empty() {
            continue;
        }
        let kind = if list.tag_name() == "ol" { "OL" } else { "UL" };
        lines.push(format!("[{}_{}_START]", kind, i));
        for (j, item) in items.iter().enumerate() {
            let text = item.stripped_text(" ");
            if !text.is_empty() {
                lines.push(format!("[{}_{}_ITEM_{}] {}", kind, i, j, text));
            }
        }
        lines.push(format!("[{}_{}_END]", kind, i));
    }
}

fn extract_tables(doc: &Document, lines: &mut Vec<String>) {
    for (i, table) in doc.select_or_empty("table").iter().enumerate() {
        let rows = table.select_or_empty("tr");
        if rows.is_empty() {
            continue;
        }
        lines.push(format!("[TABLE_{}_START]", i));
        for (j, row) in rows.iter().enumerate() {
            if let Some(line) = table_row_line(i, j, row) {
                lines.push(line);
            }
        }
        lines.push(format!("[TABLE_{}_END]", i));
    }
}

fn table_row_line(table: usize, row_index: usize, row: &Element<'_>) -> Option<String> {
    let cells = row.select_or_empty("td, th");
    let texts: Vec<String> = cells
        .iter()
        .map(|cell| cell.stripped_text(" "))
        .filter(|text| !text.is_empty())
        .collect();
    if texts.is_empty() {
        return None;
    }
    let kind = if cells.iter().any(|cell| cell.tag_name() == "th") { "HEADER" } else { "ROW" };
    Some(format!("[TABLE_{}_{}_{}] {}", table, kind, row_index, texts.join(" | ")))
}

fn extract_images(doc: &Document, lines: &mut Vec<String>) {
    for (i, img) in doc.select_or_empty("img").iter().enumerate() {
        if let Some(alt) = img.attr("alt")
            && char_len(alt) > 5
        {
            lines.push(format!("[IMG_ALT_{}] {}", i, alt));
        }
    }
}

fn extract_links(doc: &Document, lines: &mut Vec<String>) {
    for (i, link) in doc.select_or_empty("a").iter().enumerate() {
        let text = link.stripped_text(" ");
        let len = char_len(&text);
        if len <= 5 || len >= 200 {
            continue;
        }
        match link.attr("href").filter(|href| !href.is_empty() && !href.starts_with('#')) {
            Some(href) => lines.push(format!("[LINK_{}] {} -> {}", i, text, href)),
            None => lines.push(format!("[LINK_TEXT_{}] {}", i, text)),
        }
    }
}

fn extract_text_divs(doc: &Document, lines: &mut Vec<String>) {
    for (i, div) in doc.select_or_empty("div").iter().enumerate() {
        if let Some(text) = div.direct_string() {
            let text = text.trim();
            if char_len(text) > 30 {
                lines.push(format!("[DIV_TEXT_{}] {}", i, text));
            }
        }
    }
}

fn suffix(i: usize) -> String {
    if i > 0 { format!("_{}", i) } else { String::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Colossal Biosciences</title>
            <meta name="description" content="The de-extinction company">
            <meta property="og:title" content="Colossal Biosciences">
            <script>track()</script>
        </head>
        <body>
            <nav><a href="/about/">About us</a> <a href="#top">Top</a></nav>
            <h1>Bring back the mammoth</h1>
            <h2>Science</h2>
            <h2>Ethics</h2>
            <p>We combine genetic engineering with conservation biology.</p>
            <p>Short.</p>
            <ul><li>Mammoth</li><li>Thylacine</li></ul>
            <table><tr><th>Species</th><th>Year</th></tr><tr><td>Dodo</td><td></td></tr></table>
            <img src="m.png" alt="A woolly mammoth">
            <img src="x.png" alt="icon">
            <form><p>Subscribe to our newsletter today please</p></form>
            <footer>Copyright Colossal Biosciences 2021</footer>
        </body>
        </html>
    "##;

    #[test]
    fn test_source_and_metadata_first() {
        let text = html_to_text("https://archive/x", PAGE);
        let lines: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(lines[0], "[SOURCE] https://archive/x");
        assert_eq!(lines[1], "[TITLE] Colossal Biosciences");
        assert_eq!(lines[2], "[META_DESC] The de-extinction company");
        assert_eq!(lines[3], "[CONTENT_START]");
        assert!(!text.contains("[OG_TITLE]"), "og:title equal to title is skipped");
    }

    #[test]
    fn test_structural_markers() {
        let text = html_to_text("u", PAGE);
        assert!(text.contains("[NAV_0] About us Top"));
        assert!(text.contains("[H1] Bring back the mammoth"));
        assert!(text.contains("[H2] Science"));
        assert!(text.contains("[H2_1] Ethics"));
        assert!(text.contains("[P_0] We combine genetic engineering with conservation biology."));
        assert!(!text.contains("Short."));
        assert!(text.contains("[UL_0_START]"));
        assert!(text.contains("[UL_0_ITEM_1] Thylacine"));
        assert!(text.contains("[UL_0_END]"));
        assert!(text.contains("[TABLE_0_HEADER_0] Species | Year"));
        assert!(text.contains("[TABLE_0_ROW_1] Dodo"));
        assert!(text.contains("[IMG_ALT_0] A woolly mammoth"));
        assert!(!text.contains("icon"));
        assert!(text.contains("[LINK_0] About us -> /about/"));
        assert!(text.contains("[FOOTER_0] Copyright Colossal Biosciences 2021"));
    }

    #[test]
    fn test_dropped_elements() {
        let text = html_to_text("u", PAGE);
        assert!(!text.contains("track()"));
        assert!(!text.contains("newsletter"));
    }

    #[test]
    fn test_section_order() {
        let text = html_to_text("u", PAGE);
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("[NAV_0]") < pos("[H1]"));
        assert!(pos("[H1]") < pos("[H2]"));
        assert!(pos("[H2_1]") < pos("[P_0]"));
        assert!(pos("[P_0]") < pos("[UL_0_START]"));
        assert!(pos("[TABLE_0_END]") < pos("[IMG_ALT_0]"));
        assert!(pos("[LINK_0]") < pos("[FOOTER_0]"));
    }

    #[test]
    fn test_is_deterministic() {
        assert_eq!(html_to_text("u", PAGE), html_to_text("u", PAGE));
    }

    #[test]
    fn test_link_text_without_target() {
        let html = r##"<body><a href="#team">Meet the team</a><a>Plain anchor</a></body>"##;
        let text = html_to_text("u", html);
        assert!(text.contains("[LINK_TEXT_0] Meet the team"));
        assert!(text.contains("[LINK_TEXT_1] Plain anchor"));
    }

    #[test]
    fn test_main_content_and_text_divs() {
        let html = r#"
            <body>
                <main>Colossal is creating a better future for all life on Earth through science.</main>
                <div>A div holding a single long text node only.</div>
                <div>Too short</div>
            </body>
        "#;
        let text = html_to_text("u", html);
        assert!(text.contains("[MAIN_CONTENT] Colossal is creating"));
        assert!(text.contains("[DIV_TEXT_0] A div holding a single long text node only."));
        assert!(!text.contains("Too short"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(html_to_text("u", ""), "[SOURCE] u");
    }

    #[test]
    fn test_normalize_whitespace() {
        let text = "  a  \t b \n\n\n\n  c  \n d  ";
        assert_eq!(normalize_whitespace(text), "a b\n\nc\nd");
    }

    #[test]
    fn test_strip_source_lines() {
        let text = "[SOURCE] https://a\n\n[H1] Hello\n[SOURCE] https://b";
        assert_eq!(strip_source_lines(text), "\n[H1] Hello");
    }
}
