use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::app::{AppError, Result};
use crate::domain::ArticleSnapshot;
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::ContentExtractor;
use crate::scraper::Scraper;

/// Chrome-based article scraper using chromiumoxide
pub struct ChromeScraper {
    browser: Browser,
    handler: JoinHandle<()>,
    config: ScraperConfig,
    extractor: ContentExtractor,
}

impl ChromeScraper {
    /// Launch a browser with the given configuration
    pub async fn new(config: ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .request_timeout(config.timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| AppError::Scraper(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AppError::Scraper(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            )))?;

        // Drive the CDP connection
        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let extractor = ContentExtractor::new(config.clone());

        Ok(Self {
            browser,
            handler,
            config,
            extractor,
        })
    }
}

impl Drop for ChromeScraper {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl ChromeScraper {
    /// Everything between opening and closing the tab
    async fn read_page(&self, page: &Page) -> Result<serde_json::Value> {
        if let Some(ref ua) = self.config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| AppError::Scraper(format!("Failed to set user agent: {}", e)))?;
        }

        page.wait_for_navigation()
            .await
            .map_err(|e| AppError::Scraper(format!("Navigation failed: {}", e)))?;

        // Challenge pages redirect after a short delay
        tokio::time::sleep(self.config.wait_after_load()).await;

        let script = self.extractor.extraction_script();
        page.evaluate(script)
            .await
            .map_err(|e| AppError::Scraper(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| AppError::Scraper(format!("Failed to parse result: {:?}", e)))
    }
}

/// Turn the `{ title, text }` object returned by the extraction script into
/// an article
fn article_from_result(url: &str, result: &serde_json::Value) -> Result<ArticleSnapshot> {
    let title = result["title"].as_str().unwrap_or("").trim().to_string();
    let text = result["text"].as_str().unwrap_or("").trim().to_string();

    if text.is_empty() {
        return Err(AppError::Scraper(format!("No content extracted from {}", url)));
    }

    Ok(ArticleSnapshot::new(title, text))
}

#[async_trait]
impl Scraper for ChromeScraper {
    async fn scrape(&self, url: &str) -> Result<ArticleSnapshot> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::Scraper(format!("Failed to create page: {}", e)))?;

        // The tab is closed whether or not reading it worked
        let result = self.read_page(&page).await;
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page {}: {}", url, e);
        }

        article_from_result(url, &result?)
    }
}
