use crate::config::FetcherConfig;
use crate::error::{Result, WikipathError};
use crate::fetch::{LinkExtractor, PageFetcher};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Live page fetcher over HTTP.
///
/// The client timeout bounds every request, so one slow page cannot hold the
/// search loop past `fetcher.timeout_secs`.
pub struct HttpPageFetcher {
    client: Client,
    links: LinkExtractor,
}

impl HttpPageFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            links: LinkExtractor::new(&config.article_prefix)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WikipathError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikipathError::Fetch(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WikipathError::Fetch(format!("{}: failed to read body: {}", url, e)))?;

        log::debug!("Fetched {} ({} bytes) in {:?}", url, body.len(), start.elapsed());
        Ok(body)
    }

    fn extract_links(&self, page_text: &str, base_url: &str) -> Vec<String> {
        self.links.extract(page_text, base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_new() {
        let config = FetcherConfig {
            article_prefix: "https://simple.wikipedia.org/wiki/".to_string(),
            ..FetcherConfig::default()
        };
        let fetcher = HttpPageFetcher::new(&config).unwrap();
        let links = fetcher.extract_links(
            r#"<a href="/wiki/Footloose">f</a><a href="https://en.wikipedia.org/wiki/Diner">d</a>"#,
            "https://simple.wikipedia.org/wiki/Kevin_Bacon",
        );
        assert_eq!(links, vec!["https://simple.wikipedia.org/wiki/Footloose"]);
    }

    #[test]
    fn test_extract_links_delegates() {
        let fetcher = HttpPageFetcher::new(&FetcherConfig::default()).unwrap();
        let links = fetcher.extract_links(
            r#"<a href="/wiki/Footloose">f</a><a href="/wiki/Help:Contents">h</a>"#,
            "https://en.wikipedia.org/wiki/Kevin_Bacon",
        );
        assert_eq!(links, vec!["https://en.wikipedia.org/wiki/Footloose"]);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_fetch_error() {
        let config = FetcherConfig {
            timeout_secs: 1,
            ..FetcherConfig::default()
        };
        let fetcher = HttpPageFetcher::new(&config).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/wiki/Nowhere").await.unwrap_err();
        assert!(matches!(err, WikipathError::Fetch(_)));
    }
}
