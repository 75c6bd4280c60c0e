//! Page retrieval and article-link extraction.

pub mod http;
pub mod links;

pub use http::HttpPageFetcher;
pub use links::{visible_text, LinkExtractor};

use crate::error::Result;
use async_trait::async_trait;

/// Retrieves pages and lists the article links they contain.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw text of a page. Fails with `WikipathError::Fetch`.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Outbound article links of a fetched page, resolved against `base_url`.
    ///
    /// Same-domain, fragment-free, non-namespaced URLs only, in order of first
    /// appearance and without repeats.
    fn extract_links(&self, page_text: &str, base_url: &str) -> Vec<String>;
}
