use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gsc_buckets::app::AppContext;
use gsc_buckets::cli::{commands, Cli, Commands, ReportArgs};
use gsc_buckets::config::{Config, RunConfig, RunOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Run {
            domain,
            report,
            mode,
            aggregate_source,
            enrichment,
            snapshot,
        } => {
            let overrides = RunOverrides {
                output_mode: mode,
                aggregate_source,
                enrichment,
                snapshot_path: snapshot,
                ..report.overrides()
            };
            let run = RunConfig::new(&ctx.config, domain, overrides);
            commands::run(&ctx, &run).await?;
        }
        Commands::Pages { domain, report } => {
            let run = run_config(&ctx, domain, &report);
            commands::pages(&ctx, &run).await?;
        }
        Commands::Page {
            domain,
            url,
            report,
            enrichment,
            snapshot,
        } => {
            let overrides = RunOverrides {
                enrichment,
                snapshot_path: snapshot,
                ..report.overrides()
            };
            let run = RunConfig::new(&ctx.config, domain, overrides);
            commands::page(&ctx, &run, &url).await?;
        }
        Commands::Auth => {
            commands::auth(&ctx).await?;
        }
    }

    Ok(())
}

fn run_config(ctx: &AppContext, domain: String, report: &ReportArgs) -> RunConfig {
    RunConfig::new(&ctx.config, domain, report.overrides())
}
