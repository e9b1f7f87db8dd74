//! `harvestline` admin CLI — migrate the schema, inspect queue status, or
//! trigger job generation out of band from the worker processes.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvestline_core::config::load_config;
use harvestline_engine::{ClassifyJobGenerator, JobGenerator, ReadmeJobGenerator, SearchJobGenerator};
use harvestline_store::{connect, run_migrations, JobStage, JobStore, RepositoryStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "harvestline")]
#[command(about = "Admin tooling for the harvestline ingest pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Print job-queue status for each pipeline stage
    Status,
    /// Generate pending jobs for each stage that has none in flight
    Generate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let pool = connect(&config.storage)
        .await
        .context("failed to connect to postgres")?;

    match cli.command {
        Commands::Migrate => {
            run_migrations(&pool).await.context("migration failed")?;
            info!("migrations applied successfully");
        }
        Commands::Status => {
            let jobs = JobStore::new(pool);
            for stage in [JobStage::Search, JobStage::Readme, JobStage::Classify] {
                harvestline_engine::orchestrator::log_status(&jobs, stage)
                    .await
                    .context("failed to read job status")?;
            }
        }
        Commands::Generate => {
            let jobs = JobStore::new(pool.clone());
            let repos = RepositoryStore::new(pool);

            let search = SearchJobGenerator::new(
                jobs.clone(),
                config.backfill.clone(),
                config.engine.max_attempts,
            );
            let readme = ReadmeJobGenerator::new(
                jobs.clone(),
                repos.clone(),
                config.engine.readme_batch_size,
                config.engine.max_attempts,
            );
            let classify = ClassifyJobGenerator::new(
                jobs,
                repos,
                config.engine.readme_batch_size,
                config.engine.max_attempts,
            );

            for (name, generator) in [
                ("search", &search as &dyn JobGenerator),
                ("readme", &readme as &dyn JobGenerator),
                ("classify", &classify as &dyn JobGenerator),
            ] {
                let summary = generator.generate().await.context("job generation failed")?;
                info!(
                    stage = name,
                    enqueued = summary.enqueued,
                    skipped = summary.skipped_duplicate,
                    "generation complete"
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("harvestline={level},{}={level}", env!("CARGO_PKG_NAME")))
        .init();
}
