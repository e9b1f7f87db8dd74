#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod process;

use std::time::Duration;

use harvestline_core::config::load_config;
use harvestline_core::error::Result;
use harvestline_engine::{bootstrap, on_shutdown_signal, run_worker_loop, ClassifyJobGenerator, WorkerLoopConfig};
use harvestline_llm::LlmClient;
use harvestline_store::{connect, JobStage, JobStore, RepositoryStore};
use process::ClassifyStageWorker;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("starting classify worker");

    let config = load_config(None)?;

    let pool = connect(&config.storage).await?;
    let jobs = JobStore::new(pool.clone());
    let repos = RepositoryStore::new(pool.clone());

    let llm = LlmClient::new(&config.llm).await?;

    // Unlike search, generation here isn't gated on worker_id == 1: any idle
    // worker may sweep for repos needing classification, since skipping it
    // when worker 1 is down would otherwise stall generation for the fleet.
    let generator = ClassifyJobGenerator::new(
        jobs.clone(),
        repos.clone(),
        config.engine.readme_batch_size,
        config.engine.max_attempts,
    );

    bootstrap(&pool, &jobs, JobStage::Classify, Some(&generator)).await?;

    let shutdown = CancellationToken::new();
    on_shutdown_signal(shutdown.clone());

    let worker = ClassifyStageWorker::new(llm, repos, config.llm.readme_max_chars);

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
        "classify worker exiting"
    );

    Ok(())
}
