//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! archived HTML and querying it with CSS selectors.
//!
//! # Example
//!
//! ```rust
//! use palimpsest_core::parse::Document;
//!
//! let html = r#"<html><body><h1> Bring back the <em>mammoth</em> </h1></body></html>"#;
//!
//! let doc = Document::parse(html);
//! let heading = &doc.select("h1").unwrap()[0];
//! assert_eq!(heading.stripped_text(" "), "Bring back the mammoth");
//! ```

use scraper::{Html, Node, Selector};

use crate::{PalimpsestError, PreprocessConfig, Result, preprocess};

/// Represents a parsed HTML document.
///
/// Parsing is lenient: html5ever recovers from any malformed markup, so
/// construction never fails.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parses HTML from a string after stripping non-content and boilerplate
    /// elements (see [`preprocess::preprocess_html`]).
    pub fn parse_with_preprocessing(html: &str, config: &PreprocessConfig) -> Self {
        let cleaned = preprocess::preprocess_html(html, config);
        Self::parse(&cleaned)
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use palimpsest_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Like [`Document::select`], but an invalid selector yields no elements.
    pub fn select_or_empty(&'_ self, selector: &str) -> Vec<Element<'_>> {
        self.select(selector).unwrap_or_default()
    }

    /// Gets the string content of the `<title>` element.
    ///
    /// Mirrors a single-string lookup: a title whose content is split across
    /// several nodes yields `None`.
    pub fn title(&self) -> Option<String> {
        let title = self.select_or_empty("title").into_iter().next()?;
        title.direct_string()
    }

    /// Gets the trimmed `content` attribute of the first `<meta>` whose
    /// `attribute` equals `value`, e.g. `("property", "og:description")`.
    pub fn meta_content(&self, attribute: &str, value: &str) -> Option<String> {
        self.select_or_empty("meta")
            .into_iter()
            .find(|el| el.attr(attribute) == Some(value))
            .and_then(|el| el.attr("content").map(|c| c.trim().to_string()))
            .filter(|c| !c.is_empty())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PalimpsestError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A wrapper around scraper's ElementRef for easier DOM navigation.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the text nodes within this element, each trimmed, empty ones
    /// dropped, joined with `separator`.
    pub fn stripped_text(&self, separator: &str) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Gets the text of this element when its only child is a text node.
    pub fn direct_string(&self) -> Option<String> {
        let mut children = self.element.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        match only.value() {
            Node::Text(text) => Some(text.to_string()),
            _ => None,
        }
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Like [`Element::select`], but an invalid selector yields no elements.
    pub fn select_or_empty(&'_ self, selector: &str) -> Vec<Element<'a>> {
        self.select(selector).unwrap_or_default()
    }
}
