//! Article fetching for query enrichment.
//!
//! Downloads a page and pulls out its title and main text.
//!
//! # Architecture
//!
//! ```text
//! Page URL → Scraper (HTTP | Chrome) → ContentExtractor → ArticleSnapshot
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gsc_buckets::scraper::{build_scraper, ScraperConfig};
//!
//! let scraper = build_scraper(&ScraperConfig::default()).await?;
//!
//! // Never fails: errors are logged and come back as None
//! let article = scraper.article("https://example.com/post").await;
//! ```

mod chrome;
mod config;
mod extractor;
mod http;

pub use chrome::ChromeScraper;
pub use config::{ScraperBackend, ScraperConfig};
pub use extractor::ContentExtractor;
pub use http::HttpScraper;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::ArticleSnapshot;

/// Trait for article fetching implementations
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Fetch a page and extract its title and text
    async fn scrape(&self, url: &str) -> Result<ArticleSnapshot>;

    /// Like [`Scraper::scrape`], but failures and empty pages are logged and
    /// returned as `None`
    async fn article(&self, url: &str) -> Option<ArticleSnapshot> {
        info!("Getting {}", url);
        match self.scrape(url).await {
            Ok(article) if article.is_empty() => {
                warn!("No content extracted from {}", url);
                None
            }
            Ok(article) => Some(article),
            Err(e) => {
                error!("Failed to scrape {}: {}", url, e);
                None
            }
        }
    }
}

/// Create the scraper selected by `config.backend`
pub async fn build_scraper(config: &ScraperConfig) -> Result<Arc<dyn Scraper>> {
    let scraper: Arc<dyn Scraper> = match config.backend {
        ScraperBackend::Http => Arc::new(HttpScraper::new(config.clone())?),
        ScraperBackend::Chrome => Arc::new(ChromeScraper::new(config.clone()).await?),
    };
    Ok(scraper)
}
