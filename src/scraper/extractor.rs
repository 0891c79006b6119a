use std::io::Cursor;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::domain::ArticleSnapshot;
use crate::scraper::ScraperConfig;

/// Elements whose text starts on a new line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

/// Content extractor for pulling the title and main text out of a page
pub struct ContentExtractor {
    config: ScraperConfig,
    content: Vec<Selector>,
    remove: Vec<Selector>,
}

fn parse_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Ignoring invalid selector {:?}: {}", s, e);
                None
            }
        })
        .collect()
}

impl ContentExtractor {
    pub fn new(config: ScraperConfig) -> Self {
        let content = parse_selectors(&config.content_selectors);
        let remove = parse_selectors(&config.remove_selectors);
        Self {
            config,
            content,
            remove,
        }
    }

    /// Readability extraction, falling back to the selector lists when it
    /// fails or finds less than `min_content_length` characters
    pub fn extract_article(&self, html: &str, url: &str) -> ArticleSnapshot {
        match self.readable(html, url) {
            Some(article) => article,
            None => {
                debug!("Readability found no article in {}, using selectors", url);
                self.extract(html)
            }
        }
    }

    fn readable(&self, html: &str, url: &str) -> Option<ArticleSnapshot> {
        let parsed_url = Url::parse(url).ok()?;
        let mut cursor = Cursor::new(html.as_bytes());
        let product = match readability::extractor::extract(&mut cursor, &parsed_url) {
            Ok(product) => product,
            Err(e) => {
                debug!("Readability failed for {}: {}", url, e);
                return None;
            }
        };

        // Re-walk the cleaned HTML so block boundaries and removals still apply
        let fragment = Html::parse_fragment(&product.content);
        let text = self.element_text(fragment.root_element());
        if text.chars().count() <= self.config.min_content_length {
            return None;
        }

        let title = match collapse_whitespace(&product.title) {
            t if t.is_empty() => extract_title(&Html::parse_document(html)),
            t => t,
        };
        Some(ArticleSnapshot::new(title, text))
    }

    /// Extract title and main text from a full HTML document
    pub fn extract(&self, html: &str) -> ArticleSnapshot {
        let document = Html::parse_document(html);
        let title = extract_title(&document);
        let text = self.extract_text(&document);
        ArticleSnapshot::new(title, text)
    }

    /// Try content selectors in order, falling back to the whole body
    fn extract_text(&self, document: &Html) -> String {
        for selector in &self.content {
            if let Some(element) = document.select(selector).next() {
                let text = self.element_text(element);
                if text.chars().count() > self.config.min_content_length {
                    return text;
                }
            }
        }

        let body = Selector::parse("body")
            .ok()
            .and_then(|s| document.select(&s).next())
            .unwrap_or_else(|| document.root_element());
        self.element_text(body)
    }

    fn element_text(&self, element: ElementRef<'_>) -> String {
        let mut raw = String::new();
        self.collect_text(element, &mut raw);
        normalise_lines(&raw)
    }

    fn collect_text(&self, element: ElementRef<'_>, out: &mut String) {
        if self.remove.iter().any(|s| s.matches(&element)) {
            return;
        }

        let block = BLOCK_TAGS.contains(&element.value().name());
        if block {
            out.push('\n');
        }

        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
            } else if let Some(child) = ElementRef::wrap(child) {
                self.collect_text(child, out);
            }
        }

        if block {
            out.push('\n');
        }
    }

    /// JavaScript evaluated in the browser by the Chrome backend.
    ///
    /// Runs the same selector lists as [`ContentExtractor::extract`] and
    /// returns `{ title, text }`.
    pub fn extraction_script(&self) -> String {
        let remove_selectors = js_list(&self.config.remove_selectors);
        let content_selectors = js_list(&self.config.content_selectors);
        let min_length = self.config.min_content_length;

        format!(
            r#"
            (() => {{
                const removeSelectors = [{remove_selectors}];
                for (const selector of removeSelectors) {{
                    try {{
                        document.querySelectorAll(selector).forEach(el => el.remove());
                    }} catch (e) {{}}
                }}

                const title = document.title || '';
                const contentSelectors = [{content_selectors}];
                for (const selector of contentSelectors) {{
                    let element = null;
                    try {{
                        element = document.querySelector(selector);
                    }} catch (e) {{}}
                    if (element && element.innerText.trim().length > {min_length}) {{
                        return {{ title: title, text: element.innerText }};
                    }}
                }}

                const body = document.body;
                return {{ title: title, text: body ? body.innerText : '' }};
            }})()
            "#
        )
    }
}

fn js_list(selectors: &[String]) -> String {
    selectors
        .iter()
        .map(|s| format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `<title>`, then `og:title`, then the first `<h1>`
fn extract_title(document: &Html) -> String {
    let text_of = |css: &str| -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        let text = collapse_whitespace(&element.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    };

    let og_title = || -> Option<String> {
        let selector = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
        let content = document.select(&selector).next()?.value().attr("content")?;
        let text = collapse_whitespace(content);
        (!text.is_empty()).then_some(text)
    };

    text_of("title")
        .or_else(og_title)
        .or_else(|| text_of("h1"))
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace within lines and separate non-empty lines by a blank line
fn normalise_lines(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
