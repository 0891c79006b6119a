use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::Client;

use crate::app::{AppError, Result};
use crate::domain::ArticleSnapshot;
use crate::scraper::{ContentExtractor, Scraper, ScraperConfig};

/// Plain HTTP scraper that presents itself as a desktop browser.
///
/// The main text is found with readability first and the configured
/// selectors second.
///
/// Sends browser-like headers, keeps a cookie jar across requests (so a
/// challenge cookie set on one page is reused on the next) and accepts
/// compressed responses.
pub struct HttpScraper {
    client: Client,
    extractor: ContentExtractor,
}

impl HttpScraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut builder = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .default_headers(headers);

        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua.as_str());
        }

        let client = builder.build()?;
        let extractor = ContentExtractor::new(config);

        Ok(Self { client, extractor })
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ArticleSnapshot> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        let html = response.text().await?;

        let article = self.extractor.extract_article(&html, url);
        if article.text.is_empty() {
            return Err(AppError::Scraper(format!("No content extracted from {}", url)));
        }

        Ok(article)
    }
}
