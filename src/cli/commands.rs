use chrono::Local;

use crate::app::{AppContext, Result};
use crate::config::RunConfig;
use crate::pipeline::{Pipeline, RunSummary};
use crate::report::{self, ReportWriter};
use crate::source::page_report;

pub async fn run(ctx: &AppContext, run: &RunConfig) -> Result<()> {
    let source = ctx.source().await?;
    let scraper = ctx.scraper(run).await?;

    println!("Processing {} ({} days)...", run.property, run.lookback_days.abs());
    let summary = Pipeline::new(&source, scraper.as_deref(), run).run().await?;
    print_summary(&summary);
    Ok(())
}

pub async fn pages(ctx: &AppContext, run: &RunConfig) -> Result<()> {
    let source = ctx.source().await?;
    let table = page_report(&source, &run.property, run.lookback_days, run.page_decimals).await?;

    if table.rows().is_empty() {
        println!("No pages with impressions for {}", run.property);
        return Ok(());
    }

    for row in table.rows() {
        println!("{:>8}  {:>6}  {}", row.impressions, row.clicks, row.page);
    }

    let path = report::page_list_path(
        &run.output_root,
        &run.domain,
        &report::timestamp(Local::now()),
    );
    ReportWriter::new().write_table("Pages", &table, &path)?;
    println!("\n{} pages written to {}", table.rows().len(), path.display());
    Ok(())
}

pub async fn page(ctx: &AppContext, run: &RunConfig, url: &str) -> Result<()> {
    let source = ctx.source().await?;
    let scraper = ctx.scraper(run).await?;

    let path = Pipeline::new(&source, scraper.as_deref(), run)
        .run_page(url)
        .await?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub async fn auth(ctx: &AppContext) -> Result<()> {
    ctx.authenticator.authenticate().await?;
    println!(
        "Authenticated, token cached in {}",
        ctx.config.auth.credentials.display()
    );
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Processed {}/{} pages",
        summary.processed, summary.pages
    );

    if !summary.skipped.is_empty() {
        println!("Skipped {} pages:", summary.skipped.len());
        for (page, error) in &summary.skipped {
            println!("  {}: {}", page, error);
        }
    }

    println!("Wrote {} files", summary.written.len());
    for path in &summary.written {
        println!("  {}", path.display());
    }
}
