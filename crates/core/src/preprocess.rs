/// Elements that never carry readable content.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "canvas", "iframe"];

/// Interactive or tangential page furniture.
pub const FORM_TAGS: &[&str] = &["form", "aside"];

/// Navigation widgets that churn between captures without changing the message.
pub const BOILERPLATE_SELECTORS: &[&str] = &[".breadcrumb", ".pagination", ".social-links", ".footer-links"];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script, style, noscript, template, svg, canvas and iframe tags
    pub remove_non_content: bool,
    /// Whether to remove form and aside tags
    pub remove_forms: bool,
    /// Whether to remove breadcrumb, pagination and social/footer link widgets
    pub remove_boilerplate: bool,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_non_content: true, remove_forms: true, remove_boilerplate: true, remove_comments: true }
    }
}

impl PreprocessConfig {
    fn selectors(&self) -> Vec<&'static str> {
        let mut selectors = Vec::new();
        if self.remove_non_content {
            selectors.extend_from_slice(NON_CONTENT_TAGS);
        }
        if self.remove_forms {
            selectors.extend_from_slice(FORM_TAGS);
        }
        if self.remove_boilerplate {
            selectors.extend_from_slice(BOILERPLATE_SELECTORS);
        }
        selectors
    }
}

/// Preprocess HTML by removing non-content and boilerplate elements.
///
/// Rewriting is streaming and never fails the caller: if the rewriter rejects
/// the input, the original markup is returned untouched.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let selectors = config.selectors();
    if selectors.is_empty() && !config.remove_comments {
        return html.to_string();
    }
    remove_elements(html, &selectors, config.remove_comments)
}

/// Remove every element matching one of `selectors`, together with its content
fn remove_elements(html: &str, selectors: &[&str], remove_comments: bool) -> String {
    let mut output: Vec<u8> = Vec::with_capacity(html.len());

    let element_content_handlers = selectors
        .iter()
        .map(|selector| {
            lol_html::element!(*selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    let document_content_handlers = if remove_comments {
        vec![lol_html::doc_comments!(|c| {
            c.remove();
            Ok(())
        })]
    } else {
        Vec::new()
    };

    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers, document_content_handlers, ..Default::default() },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { String::from_utf8_lossy(&output).into_owned() }
}
