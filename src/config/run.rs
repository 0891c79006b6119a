//! Settings for a single run, merged from the config file and the command line.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Which workbooks a run writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One workbook per page
    PerPage,
    /// One workbook for the whole property
    #[default]
    Aggregate,
    Both,
}

impl OutputMode {
    pub fn per_page(self) -> bool {
        matches!(self, OutputMode::PerPage | OutputMode::Both)
    }

    pub fn aggregate(self) -> bool {
        matches!(self, OutputMode::Aggregate | OutputMode::Both)
    }
}

/// Where the aggregate table comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateSource {
    /// Concatenation of the per-page tables
    #[default]
    Accumulated,
    /// A separate unfiltered query report
    Fetched,
}

/// How `exists_on_site` is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EnrichmentSource {
    /// Fetch each page's article
    #[default]
    Scrape,
    /// Count over a gzip dump of the whole site
    Snapshot,
    None,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub property: Option<String>,
    pub lookback_days: Option<i64>,
    pub output_mode: Option<OutputMode>,
    pub aggregate_source: Option<AggregateSource>,
    pub enrichment: Option<EnrichmentSource>,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub domain: String,
    /// Search Console property, `sc-domain:<domain>` unless overridden
    pub property: String,
    pub lookback_days: i64,
    pub output_mode: OutputMode,
    pub aggregate_source: AggregateSource,
    pub enrichment: EnrichmentSource,
    pub snapshot_path: Option<PathBuf>,
    pub output_root: PathBuf,
    pub query_decimals: u32,
    pub page_decimals: u32,
    pub aggregate_decimals: u32,
    pub drop_ctr: bool,
    pub write_page_list: bool,
}

impl RunConfig {
    pub fn new(config: &Config, domain: impl Into<String>, overrides: RunOverrides) -> Self {
        let domain = domain.into().trim().to_string();
        let property = overrides
            .property
            .unwrap_or_else(|| format!("sc-domain:{}", domain));

        Self {
            property,
            lookback_days: overrides.lookback_days.unwrap_or(config.report.lookback_days),
            output_mode: overrides.output_mode.unwrap_or(config.output.mode),
            aggregate_source: overrides
                .aggregate_source
                .unwrap_or(config.output.aggregate_source),
            enrichment: overrides.enrichment.unwrap_or(config.enrichment.source),
            snapshot_path: overrides
                .snapshot_path
                .or_else(|| config.enrichment.snapshot_path.clone()),
            output_root: config.output.root.clone(),
            query_decimals: config.report.query_decimals,
            page_decimals: config.report.page_decimals,
            aggregate_decimals: config.report.aggregate_decimals,
            drop_ctr: config.report.drop_ctr,
            write_page_list: config.output.write_page_list,
            domain,
        }
    }

    /// Folder every workbook of this run is written to
    pub fn domain_dir(&self) -> PathBuf {
        self.output_root.join(&self.domain)
    }
}
