//! HTML helpers: article-link extraction and visible text for embedding.

use crate::error::{Result, WikipathError};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| WikipathError::Config(format!("Invalid selector '{}': {:?}", s, e)))
}

/// Pulls article links out of a page.
///
/// A link qualifies when its resolved URL sits directly under the article
/// prefix and its title carries no namespace (`:`), fragment or query.
pub struct LinkExtractor {
    article: Regex,
    anchors: Selector,
}

impl LinkExtractor {
    /// `article_prefix` is e.g. `https://en.wikipedia.org/wiki/`
    pub fn new(article_prefix: &str) -> Result<Self> {
        let pattern = format!("^{}[^:#?]+$", regex::escape(article_prefix));
        let article = Regex::new(&pattern)
            .map_err(|e| WikipathError::Config(format!("Invalid article prefix: {}", e)))?;

        Ok(Self {
            article,
            anchors: parse_selector("a[href]")?,
        })
    }

    pub fn is_article(&self, url: &str) -> bool {
        self.article.is_match(url)
    }

    pub fn extract(&self, html: &str, base_url: &str) -> Vec<String> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                log::warn!("Cannot resolve links against '{}': {}", base_url, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if href.contains('#') {
                continue;
            }
            let Ok(resolved) = base.join(href) else {
                continue;
            };
            let resolved = String::from(resolved);
            if self.is_article(&resolved) && seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }

        links
    }
}

/// Title and paragraph text of an HTML page.
///
/// Falls back to the trimmed input when the document has neither, so plain
/// text passes through unchanged.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for selector in ["title", "p"] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }

    if parts.is_empty() {
        html.trim().to_string()
    } else {
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://en.wikipedia.org/wiki/";
    const BASE: &str = "https://en.wikipedia.org/wiki/Rust_(programming_language)";

    fn extractor() -> LinkExtractor {
        LinkExtractor::new(PREFIX).unwrap()
    }

    #[test]
    fn test_extracts_relative_and_absolute_article_links() {
        let html = r#"<html><body>
            <a href="/wiki/Mozilla">Mozilla</a>
            <a href="https://en.wikipedia.org/wiki/Graydon_Hoare">Hoare</a>
            <a href="Cargo_(software)">Cargo</a>
        </body></html>"#;
        assert_eq!(
            extractor().extract(html, BASE),
            vec![
                "https://en.wikipedia.org/wiki/Mozilla",
                "https://en.wikipedia.org/wiki/Graydon_Hoare",
                "https://en.wikipedia.org/wiki/Cargo_(software)",
            ]
        );
    }

    #[test]
    fn test_filters_namespaces_fragments_and_other_domains() {
        let html = r##"<html><body>
            <a href="/wiki/Special:Random">random</a>
            <a href="/wiki/File:Logo.svg">file</a>
            <a href="/wiki/Mozilla#History">section</a>
            <a href="#cite_note-1">cite</a>
            <a href="https://de.wikipedia.org/wiki/Mozilla">de</a>
            <a href="https://example.com/wiki/Mozilla">other</a>
            <a href="/w/index.php?title=Rust&action=edit">edit</a>
            <a>no href</a>
            <a href="/wiki/LLVM">llvm</a>
        </body></html>"##;
        assert_eq!(
            extractor().extract(html, BASE),
            vec!["https://en.wikipedia.org/wiki/LLVM"]
        );
    }

    #[test]
    fn test_deduplicates_in_first_appearance_order() {
        let html = r#"<a href="/wiki/B">b</a><a href="/wiki/A">a</a><a href="/wiki/B">b again</a>"#;
        assert_eq!(
            extractor().extract(html, BASE),
            vec![
                "https://en.wikipedia.org/wiki/B",
                "https://en.wikipedia.org/wiki/A",
            ]
        );
    }

    #[test]
    fn test_bad_base_yields_nothing() {
        assert!(extractor().extract(r#"<a href="/wiki/A">a</a>"#, "not a url").is_empty());
    }

    #[test]
    fn test_is_article() {
        let ex = extractor();
        assert!(ex.is_article("https://en.wikipedia.org/wiki/Six_degrees_of_separation"));
        assert!(!ex.is_article("https://en.wikipedia.org/wiki/Talk:Rust"));
        assert!(!ex.is_article("https://en.wikipedia.org/wiki/"));
        assert!(!ex.is_article("https://en.wikipedia.org/wiki/Rust?action=raw"));
        assert!(ex.is_article("https://en.wikipedia.org/wiki/AC/DC"));
    }

    #[test]
    fn test_visible_text_from_html() {
        let html = "<html><head><title>Rust</title><script>var x;</script></head>\
                    <body><p>Rust is a language.</p><div>menu</div><p> Fast. </p></body></html>";
        assert_eq!(visible_text(html), "Rust\nRust is a language.\nFast.");
    }

    #[test]
    fn test_visible_text_plain_passthrough() {
        assert_eq!(visible_text("  just words  "), "just words");
    }
}
