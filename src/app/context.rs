use std::sync::Arc;

use crate::app::error::Result;
use crate::auth::Authenticator;
use crate::config::{Config, EnrichmentSource, RunConfig};
use crate::scraper::{build_scraper, Scraper};
use crate::source::SearchConsoleSource;

pub struct AppContext {
    pub config: Config,
    pub authenticator: Arc<Authenticator>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let authenticator = Authenticator::new(
            config.auth.client_secrets.clone(),
            config.auth.credentials.clone(),
            config.auth.open_browser,
        )?;

        Ok(Self {
            config,
            authenticator: Arc::new(authenticator),
        })
    }

    /// Log in and build an API client that refreshes its token as it goes
    pub async fn source(&self) -> Result<SearchConsoleSource> {
        self.authenticator.authenticate().await?;
        SearchConsoleSource::with_tokens(
            self.authenticator.clone(),
            self.config.report.api_base.clone(),
            self.config.report.row_limit,
        )
    }

    /// Article fetcher, only when the run enriches by scraping
    pub async fn scraper(&self, run: &RunConfig) -> Result<Option<Arc<dyn Scraper>>> {
        if run.enrichment != EnrichmentSource::Scrape {
            return Ok(None);
        }
        build_scraper(&self.config.scraper).await.map(Some)
    }
}
