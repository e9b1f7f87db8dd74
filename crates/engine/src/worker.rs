//! Generic claim/process/complete loop shared by all three stage workers.
//!
//! Poll for work, process what was claimed, back off and optionally
//! auto-exit when the queue empties out. The stage-specific part (what a
//! job payload means, how to turn it into side effects) lives behind the
//! [`StageWorker`] trait; this module only owns the polling/backoff/
//! outcome-application shell.
//!
//! Shutdown is checked before every claimed job, not just between batches:
//! if the cancellation token fires mid-batch, the job about to be processed
//! and anything still unprocessed in that batch are released back to
//! `pending` via [`JobStore::release_held`] rather than left `running`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvestline_core::error::Result;
use harvestline_store::{ClaimedJob, JobStage, JobStore};
use tokio_util::sync::CancellationToken;

/// What happened to a single claimed job.
pub enum WorkerOutcome {
    /// The job is finished. The optional payload replaces the stored one
    /// (e.g. to record `repos_count`), matching `done`'s `repos_count` field.
    Done(Option<serde_json::Value>),
    /// README-stage only: the repository has no README, a terminal
    /// non-failure outcome distinct from `Done`.
    NoReadme,
    /// The upstream API is rate limiting this worker. The job is reverted to
    /// `pending` without charging it an attempt.
    RateLimited(DateTime<Utc>),
    /// Processing failed. Recorded as an attempt; transitions to `failed`
    /// once `max_attempts` is exhausted.
    Failed(String),
}

/// Stage-specific job processing, implemented once per binary crate.
#[async_trait]
pub trait StageWorker: Send + Sync {
    fn stage(&self) -> JobStage;

    /// Optional `(worker_id, total_workers)` partition restricting which
    /// jobs this worker is allowed to claim (README stage only).
    fn partition(&self) -> Option<(u32, u32)> {
        None
    }

    async fn process(&self, job: &ClaimedJob) -> WorkerOutcome;
}

/// Tunables for [`run_worker_loop`], assembled from [`harvestline_core::config::EngineConfig`].
pub struct WorkerLoopConfig {
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub auto_exit: bool,
}

/// Counters accumulated over a worker's lifetime, for status reporting.
#[derive(Default)]
pub struct WorkerStats {
    pub processed: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

/// Runs the poll → claim → process → complete loop until cancelled, or
/// until `auto_exit` is set and the stage's queue has no active jobs left in
/// this worker's partition.
pub async fn run_worker_loop(
    jobs: &JobStore,
    worker: &dyn StageWorker,
    config: &WorkerLoopConfig,
    shutdown: &CancellationToken,
) -> Result<WorkerStats> {
    let stats = WorkerStats::default();
    let stage = worker.stage();
    let mut consecutive_empty: u64 = 0;

    tracing::info!(stage = ?stage_name(stage), "worker started, polling for jobs");

    loop {
        if shutdown.is_cancelled() {
            tracing::info!(stage = ?stage_name(stage), "shutdown requested, stopping worker loop");
            break;
        }

        let claimed = jobs
            .claim_batch(stage, config.batch_size, worker.partition())
            .await?;

        if claimed.is_empty() {
            consecutive_empty += 1;

            if config.auto_exit && jobs.count_active(stage).await? == 0 {
                tracing::info!(stage = ?stage_name(stage), "no active jobs remain, exiting");
                break;
            }

            if consecutive_empty == 1 {
                tracing::info!(stage = ?stage_name(stage), "no pending jobs, waiting");
            } else if consecutive_empty % 10 == 0 {
                tracing::info!(
                    stage = ?stage_name(stage),
                    polls = consecutive_empty,
                    "still waiting for jobs"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(config.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!(stage = ?stage_name(stage), "shutdown requested while idle");
                    break;
                }
            }
            continue;
        }

        consecutive_empty = 0;

        let mut claimed = claimed.into_iter();
        for job in claimed.by_ref() {
            if shutdown.is_cancelled() {
                tracing::info!(
                    stage = ?stage_name(stage),
                    job_id = %job.id,
                    "shutdown requested, releasing held job back to pending"
                );
                release_held(jobs, stage, &job).await;
                break;
            }

            stats.processed.fetch_add(1, Ordering::Relaxed);
            apply_outcome(jobs, stage, &job, worker.process(&job).await, &stats).await?;
        }

        // Anything left in the batch after a mid-batch shutdown is still
        // `running` and was never handed to `worker.process`; release it too
        // so a restart doesn't find it stuck.
        for job in claimed {
            release_held(jobs, stage, &job).await;
        }

        if shutdown.is_cancelled() {
            break;
        }
    }

    Ok(stats)
}

/// Reverts a claimed-but-unprocessed job to `pending` without charging it an
/// attempt. Logs rather than propagates on failure: shutdown is already in
/// progress and a failed release here shouldn't block the exit.
async fn release_held(jobs: &JobStore, stage: JobStage, job: &ClaimedJob) {
    if let Err(e) = jobs.release_held(stage, job.id).await {
        tracing::error!(job_id = %job.id, error = %e, "failed to release held job on shutdown");
    }
}

async fn apply_outcome(
    jobs: &JobStore,
    stage: JobStage,
    job: &ClaimedJob,
    outcome: WorkerOutcome,
    stats: &WorkerStats,
) -> Result<()> {
    match outcome {
        WorkerOutcome::Done(result_payload) => {
            jobs.mark_done(stage, job.id, result_payload).await?;
            stats.succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(job_id = %job.id, stage = ?stage_name(stage), "job completed");
        }
        WorkerOutcome::NoReadme => {
            jobs.mark_no_readme(job.id).await?;
            stats.succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(job_id = %job.id, "no README found, marked terminal");
        }
        WorkerOutcome::RateLimited(reset_at) => {
            jobs.revert_for_rate_limit(stage, job.id, reset_at).await?;
            tracing::warn!(job_id = %job.id, %reset_at, "rate limited, reverted to pending");

            let wait = (reset_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            if wait > Duration::ZERO {
                tokio::time::sleep(wait + Duration::from_secs(2)).await;
            }
        }
        WorkerOutcome::Failed(message) => {
            jobs.mark_failed_or_retry(stage, job.id, job.attempts, job.max_attempts, &message)
                .await?;
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(job_id = %job.id, error = %message, "job failed");
        }
    }

    Ok(())
}

fn stage_name(stage: JobStage) -> &'static str {
    match stage {
        JobStage::Search => "search",
        JobStage::Readme => "readme",
        JobStage::Classify => "classify",
    }
}
