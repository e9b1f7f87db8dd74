#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod process;

use std::time::Duration;

use harvestline_core::config::load_config;
use harvestline_core::error::Result;
use harvestline_engine::{bootstrap, on_shutdown_signal, run_worker_loop, SearchJobGenerator, WorkerLoopConfig};
use harvestline_github_client::GithubClient;
use harvestline_store::{connect, JobStage, JobStore, RepositoryStore};
use process::SearchStageWorker;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("starting search worker");

    let config = load_config(None)?;

    let pool = connect(&config.storage).await.map_err(|e| {
        error!("failed to connect to postgres: {e}");
        e
    })?;

    let jobs = JobStore::new(pool.clone());
    let repos = RepositoryStore::new(pool.clone());

    let token = config
        .github_tokens
        .token_for(config.worker.worker_id)
        .ok_or_else(|| harvestline_core::error::Error::config("no github token configured"))?
        .to_string();
    let github = GithubClient::new(token)?;

    let generate_now = config.worker.worker_id == 1;
    let generator = SearchJobGenerator::new(jobs.clone(), config.backfill.clone(), config.engine.max_attempts);

    bootstrap(
        &pool,
        &jobs,
        JobStage::Search,
        if generate_now { Some(&generator) } else { None },
    )
    .await?;

    let shutdown = CancellationToken::new();
    on_shutdown_signal(shutdown.clone());

    let worker = SearchStageWorker::new(
        github,
        repos,
        config.repo_filter.clone(),
        config.pipeline_version.clone(),
    );

    let loop_config = WorkerLoopConfig {
        batch_size: 1,
        poll_interval: Duration::from_secs(config.engine.poll_interval_secs),
        auto_exit: config.engine.auto_exit,
    };

    let stats = run_worker_loop(&jobs, &worker, &loop_config, &shutdown).await?;
    info!(
        processed = stats.processed.load(std::sync::atomic::Ordering::Relaxed),
        succeeded = stats.succeeded.load(std::sync::atomic::Ordering::Relaxed),
        failed = stats.failed.load(std::sync::atomic::Ordering::Relaxed),
        "search worker exiting"
    );

    Ok(())
}
