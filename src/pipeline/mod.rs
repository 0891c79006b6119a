//! The run loop: page list, per-page reports, aggregate.
//!
//! Everything runs strictly in order. A page whose report cannot be fetched
//! is logged and skipped; failing to write a workbook ends the run.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::app::Result;
use crate::bucket::Bucketizer;
use crate::config::{AggregateSource, EnrichmentSource, RunConfig};
use crate::domain::{Column, QueryTable};
use crate::enrich::{self, find_latest_snapshot, SiteSnapshot};
use crate::report::{self, ReportWriter};
use crate::scraper::Scraper;
use crate::source::{page_report, query_report, PageFilter, ReportSource};

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub processed: usize,
    /// Pages whose report failed, with the error message
    pub skipped: Vec<(String, String)>,
    pub written: Vec<PathBuf>,
}

pub struct Pipeline<'a> {
    source: &'a dyn ReportSource,
    scraper: Option<&'a dyn Scraper>,
    writer: ReportWriter,
    bucketizer: Bucketizer,
    run: &'a RunConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn ReportSource,
        scraper: Option<&'a dyn Scraper>,
        run: &'a RunConfig,
    ) -> Self {
        let mut writer = ReportWriter::new();
        if run.drop_ctr {
            writer = writer.without_column(Column::Ctr);
        }

        Self {
            source,
            scraper,
            writer,
            bucketizer: Bucketizer::default(),
            run,
        }
    }

    pub fn with_bucketizer(mut self, bucketizer: Bucketizer) -> Self {
        self.bucketizer = bucketizer;
        self
    }

    /// Process every page of the property
    pub async fn run(&self) -> Result<RunSummary> {
        let stamp = report::timestamp(Local::now());
        let snapshot = self.load_snapshot()?;
        let mut summary = RunSummary::default();

        let page_table = page_report(
            self.source,
            &self.run.property,
            self.run.lookback_days,
            self.run.page_decimals,
        )
        .await?;
        let pages = page_table.pages();
        summary.pages = pages.len();
        info!(property = %self.run.property, pages = pages.len(), "page list fetched");

        if self.run.write_page_list {
            let path = report::page_list_path(&self.run.output_root, &self.run.domain, &stamp);
            self.writer.write_table("Pages", &page_table, &path)?;
            summary.written.push(path);
        }

        let accumulate = self.run.output_mode.aggregate()
            && self.run.aggregate_source == AggregateSource::Accumulated;
        let mut accumulated = Vec::new();
        let mut taken = HashSet::new();

        let pb = ProgressBar::new(pages.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=> "));
        }

        for page in &pages {
            pb.set_message(page.clone());
            match self.page_table(page, snapshot.as_ref()).await {
                Ok(table) => {
                    summary.processed += 1;
                    if self.run.output_mode.per_page() {
                        summary
                            .written
                            .push(self.write_page(page, &table, &stamp, &mut taken)?);
                    }
                    if accumulate {
                        accumulated.push(table);
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", page, e);
                    summary.skipped.push((page.clone(), e.to_string()));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if self.run.output_mode.aggregate() {
            let table = match self.run.aggregate_source {
                AggregateSource::Accumulated => {
                    let mut table = QueryTable::concat(accumulated);
                    table.sort_by_impressions();
                    table
                }
                AggregateSource::Fetched => self.fetched_aggregate(snapshot.as_ref()).await?,
            };

            let path = report::aggregate_report_path(&self.run.output_root, &self.run.domain, &stamp);
            self.writer.write(&self.bucketizer.bucketize(&table), &path)?;
            info!(rows = table.rows().len(), path = %path.display(), "aggregate written");
            summary.written.push(path);
        }

        Ok(summary)
    }

    /// Report a single page, ignoring the configured output mode
    pub async fn run_page(&self, page: &str) -> Result<PathBuf> {
        let stamp = report::timestamp(Local::now());
        let snapshot = self.load_snapshot()?;
        let table = self.page_table(page, snapshot.as_ref()).await?;
        self.write_page(page, &table, &stamp, &mut HashSet::new())
    }

    fn load_snapshot(&self) -> Result<Option<SiteSnapshot>> {
        if self.run.enrichment != EnrichmentSource::Snapshot {
            return Ok(None);
        }

        let path = match &self.run.snapshot_path {
            Some(path) => path.clone(),
            None => find_latest_snapshot(&self.run.domain_dir())?,
        };
        SiteSnapshot::load(&path).map(Some)
    }

    /// Fetch and enrich the query table of one page
    async fn page_table(&self, page: &str, snapshot: Option<&SiteSnapshot>) -> Result<QueryTable> {
        let mut table = query_report(
            self.source,
            &self.run.property,
            self.run.lookback_days,
            Some(PageFilter::equals(page)),
            self.run.query_decimals,
        )
        .await?;
        table.attach_page(page);

        let table = match self.run.enrichment {
            EnrichmentSource::Scrape => match self.scraper {
                Some(scraper) => {
                    let article = scraper.article(page).await;
                    if article.is_none() {
                        warn!("No article for {}, writing without enrichment", page);
                    }
                    enrich::enrich(table, article.as_ref())
                }
                None => table,
            },
            EnrichmentSource::Snapshot => match snapshot {
                Some(snapshot) => snapshot.enrich(table),
                None => table,
            },
            EnrichmentSource::None => table,
        };

        Ok(table)
    }

    fn write_page(
        &self,
        page: &str,
        table: &QueryTable,
        stamp: &str,
        taken: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf> {
        let path = report::unique_path(
            report::page_report_path(&self.run.output_root, &self.run.domain, page, stamp),
            taken,
        );
        self.writer.write(&self.bucketizer.bucketize(table), &path)?;
        taken.insert(path.clone());
        Ok(path)
    }

    async fn fetched_aggregate(&self, snapshot: Option<&SiteSnapshot>) -> Result<QueryTable> {
        let table = query_report(
            self.source,
            &self.run.property,
            self.run.lookback_days,
            None,
            self.run.aggregate_decimals,
        )
        .await?;

        Ok(match snapshot {
            Some(snapshot) => snapshot.enrich(table),
            None => table,
        })
    }
}
