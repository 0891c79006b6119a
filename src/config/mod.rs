//! Configuration management for gsc-buckets.
//!
//! Configuration is read from `~/.config/gsc-buckets/config.toml` at startup,
//! or from the path given with `--config`. If the default file doesn't exist,
//! a default configuration with comments is created.

pub mod run;

pub use run::{AggregateSource, EnrichmentSource, OutputMode, RunConfig, RunOverrides};

use crate::scraper::ScraperConfig;
use crate::source::search_console::{DEFAULT_API_BASE, MAX_ROW_LIMIT};
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
    pub enrichment: EnrichmentConfig,
    pub scraper: ScraperConfig,
}

/// OAuth file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Client secrets downloaded from the Google Cloud console
    pub client_secrets: PathBuf,
    /// Token cache written after the first login
    pub credentials: PathBuf,
    /// Open the consent URL in the default browser
    pub open_browser: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secrets: PathBuf::from("client_secrets.json"),
            credentials: PathBuf::from("credentials.json"),
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub lookback_days: i64,
    pub query_decimals: u32,
    pub page_decimals: u32,
    pub aggregate_decimals: u32,
    pub drop_ctr: bool,
    /// Rows per API request
    pub row_limit: u32,
    pub api_base: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            query_decimals: 1,
            page_decimals: 1,
            aggregate_decimals: 0,
            drop_ctr: false,
            row_limit: MAX_ROW_LIMIT,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Workbooks go to `<root>/<domain>/`
    pub root: PathBuf,
    pub mode: OutputMode,
    pub aggregate_source: AggregateSource,
    pub write_page_list: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            mode: OutputMode::default(),
            aggregate_source: AggregateSource::default(),
            write_page_list: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub source: EnrichmentSource,
    /// Gzip site snapshot; the newest `*.gz` in the domain folder when unset
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// A missing default file is created with comments. An explicit path
    /// must exist. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        Self::load_from(&config_path)
    }

    /// Parse the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/gsc-buckets/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("gsc-buckets").join("config.toml"))
    }

    /// Create a default config file with comments.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# gsc-buckets configuration
#
# Relative paths are resolved from the working directory.

[auth]
# OAuth client downloaded from the Google Cloud console
client_secrets = "client_secrets.json"

# Token cache, written after the first login
credentials = "credentials.json"

# Open the consent page in the default browser
open_browser = true

[report]
# Days to look back from today
lookback_days = 90

# Decimals kept for ctr and position
query_decimals = 1
page_decimals = 1
aggregate_decimals = 0

# Leave the ctr column out of every workbook
drop_ctr = false

# Rows per API request (at most 25000)
row_limit = 25000

api_base = "https://www.googleapis.com/webmasters/v3"

[output]
# Workbooks are written to <root>/<domain>/
root = "data"

# per-page, aggregate or both
mode = "aggregate"

# accumulated: stack the per-page tables
# fetched: one unfiltered query report for the whole property
aggregate_source = "accumulated"

# Also write the list of pages to <domain>-pages-<timestamp>.xlsx
write_page_list = true

[enrichment]
# scrape: fetch each page and count query hits in its article
# snapshot: count hits in a gzip dump of the whole site
# none: skip enrichment
source = "scrape"

# Snapshot file; defaults to the newest *.gz in <root>/<domain>/
# snapshot_path = "data/example.com/site.txt.gz"

[scraper]
# http or chrome
backend = "http"

# Run browser in headless mode (no visible window)
headless = true

# Request / page load timeout in seconds
timeout_secs = 30

# Wait time after page load for dynamic content (milliseconds)
wait_after_load_ms = 1000

# Shortest text a content selector must yield to be used
min_content_length = 100

# CSS selectors to try for article content extraction (in priority order)
content_selectors = [
    "article",
    "[role=\"main\"]",
    "main",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".content",
    "#content",
    ".post",
    ".article",
    ".blog-post",
]

# Elements to remove before extraction (ads, navigation, etc.)
remove_selectors = [
    "nav",
    "header",
    "footer",
    "aside",
    ".sidebar",
    ".advertisement",
    ".ad",
    ".ads",
    ".social-share",
    ".comments",
    ".related-posts",
    "script",
    "style",
    "noscript",
]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::ScraperBackend;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.report.lookback_days, 90);
        assert_eq!(config.report.row_limit, 25_000);
        assert_eq!(config.output.mode, OutputMode::Aggregate);
        assert_eq!(config.enrichment.source, EnrichmentSource::Scrape);
        assert_eq!(config.scraper.backend, ScraperBackend::Http);
        assert_eq!(
            config.scraper.content_selectors,
            ScraperConfig::default().content_selectors
        );
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[output]
mode = "both"
aggregate_source = "fetched"

[scraper]
backend = "chrome"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom values
        assert_eq!(config.output.mode, OutputMode::Both);
        assert_eq!(config.output.aggregate_source, AggregateSource::Fetched);
        assert_eq!(config.scraper.backend, ScraperBackend::Chrome);
        // Default values
        assert_eq!(config.output.root, PathBuf::from("data"));
        assert!(config.output.write_page_list);
        assert_eq!(config.report.aggregate_decimals, 0);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.auth.credentials, PathBuf::from("credentials.json"));
        assert_eq!(config.report.api_base, DEFAULT_API_BASE);
        assert!(config.enrichment.snapshot_path.is_none());
    }

    #[test]
    fn test_invalid_mode_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\nmode = \"sideways\"\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_create_default_config_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::create_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.report.query_decimals, 1);
        assert!(!config.report.drop_ctr);
    }
}
