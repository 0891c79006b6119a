pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AggregateSource, EnrichmentSource, OutputMode, RunOverrides};

#[derive(Parser)]
#[command(name = "gsc-buckets")]
#[command(about = "Bucket Search Console queries into spreadsheets", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/gsc-buckets/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that queries a property
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Days to look back from today
    #[arg(short, long, allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Search Console property (default: sc-domain:<domain>)
    #[arg(long)]
    pub property: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bucket the queries of every page of a site
    Run {
        /// Site domain, e.g. example.com
        domain: String,

        #[command(flatten)]
        report: ReportArgs,

        /// Which workbooks to write
        #[arg(short, long, value_enum)]
        mode: Option<OutputMode>,

        /// Where the aggregate table comes from
        #[arg(long, value_enum)]
        aggregate_source: Option<AggregateSource>,

        /// How exists_on_site is computed
        #[arg(short, long, value_enum)]
        enrichment: Option<EnrichmentSource>,

        /// Gzip site snapshot for snapshot enrichment
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Write the page list of a site
    Pages {
        domain: String,

        #[command(flatten)]
        report: ReportArgs,
    },
    /// Bucket the queries of a single page
    Page {
        domain: String,

        /// Full page URL
        url: String,

        #[command(flatten)]
        report: ReportArgs,

        #[arg(short, long, value_enum)]
        enrichment: Option<EnrichmentSource>,

        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Log in and cache the OAuth token
    Auth,
}

impl ReportArgs {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            property: self.property.clone(),
            lookback_days: self.days,
            ..RunOverrides::default()
        }
    }
}
