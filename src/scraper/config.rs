use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which client fetches article pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScraperBackend {
    /// Plain HTTP with browser-like headers and a cookie jar
    #[default]
    Http,
    /// Headless Chromium, for hosts that serve a JavaScript challenge
    Chrome,
}

/// Configuration for the article scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Fetch backend (default: http)
    pub backend: ScraperBackend,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Minimum text length for a content selector to be accepted (default: 100)
    pub min_content_length: usize,

    /// Request / page load timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Wait time after page load for dynamic content in milliseconds (default: 1000)
    pub wait_after_load_ms: u64,

    /// CSS selectors to try for article content extraction, in priority order
    pub content_selectors: Vec<String>,

    /// CSS selectors for elements to leave out (ads, navigation, etc.)
    pub remove_selectors: Vec<String>,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            backend: ScraperBackend::Http,
            headless: true,
            min_content_length: 100,
            timeout_secs: 30,
            wait_after_load_ms: 1000,
            content_selectors: vec![
                "article".to_string(),
                "[role=\"main\"]".to_string(),
                "main".to_string(),
                ".post-content".to_string(),
                ".article-content".to_string(),
                ".entry-content".to_string(),
                ".content".to_string(),
                "#content".to_string(),
                ".post".to_string(),
                ".article".to_string(),
                ".blog-post".to_string(),
            ],
            remove_selectors: vec![
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
                "aside".to_string(),
                ".sidebar".to_string(),
                ".advertisement".to_string(),
                ".ad".to_string(),
                ".ads".to_string(),
                ".social-share".to_string(),
                ".comments".to_string(),
                ".related-posts".to_string(),
                "script".to_string(),
                "style".to_string(),
                "noscript".to_string(),
            ],
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert_eq!(config.backend, ScraperBackend::Http);
        assert!(config.headless);
        assert_eq!(config.min_content_length, 100);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.wait_after_load_ms, 1000);
        assert!(!config.content_selectors.is_empty());
        assert!(!config.remove_selectors.is_empty());
        assert!(config.user_agent.is_some());
    }

    #[test]
    fn test_durations() {
        let config = ScraperConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.wait_after_load(), Duration::from_millis(1000));
    }

    #[test]
    fn test_backend_from_toml() {
        let config: ScraperConfig = toml::from_str("backend = \"chrome\"").unwrap();
        assert_eq!(config.backend, ScraperBackend::Chrome);
        assert_eq!(config.timeout_secs, 30);
    }
}
