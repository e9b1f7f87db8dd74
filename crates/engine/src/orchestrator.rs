//! Process bootstrap shared by all three stage binaries: migrate, ping,
//! recover stale jobs, generate work only if the queue is empty, print a
//! status summary — the same four steps for any stage via [`JobGenerator`].

use harvestline_core::error::Result;
use harvestline_store::{JobStage, JobStore};
use sqlx::PgPool;

use crate::generator::JobGenerator;

/// Runs migrations, verifies connectivity, reclaims stale jobs, and
/// generates new work only when this stage's queue is empty, so restarts
/// don't keep appending duplicate backfill windows.
pub async fn bootstrap(
    pool: &PgPool,
    jobs: &JobStore,
    stage: JobStage,
    generator: Option<&dyn JobGenerator>,
) -> Result<()> {
    harvestline_store::run_migrations(pool).await?;
    tracing::info!("migrations applied");

    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| harvestline_core::error::Error::store(format!("postgres ping failed: {e}")))?;
    tracing::info!("postgres connection verified");

    let reclaimed = jobs.cleanup_stale(stage).await?;
    if reclaimed > 0 {
        tracing::info!(count = reclaimed, "restored stale running jobs to pending");
    }

    let active = jobs.count_active(stage).await?;
    if active > 0 {
        tracing::info!(
            active,
            "active jobs exist, continuing with existing jobs"
        );
    } else if let Some(generator) = generator {
        tracing::info!("no active jobs, generating new work");
        let summary = generator.generate().await?;
        tracing::info!(
            enqueued = summary.enqueued,
            skipped = summary.skipped_duplicate,
            "job generation complete"
        );
    }

    log_status(jobs, stage).await?;
    Ok(())
}

/// Logs a one-line-per-status breakdown, the Rust equivalent of
/// `print_job_status`'s aggregation pipeline.
pub async fn log_status(jobs: &JobStore, stage: JobStage) -> Result<()> {
    let counts = jobs.count_by_status(stage).await?;
    let total: i64 = counts.iter().map(|(_, count)| count).sum();

    tracing::info!(total, "job status summary");
    for (status, count) in counts {
        tracing::info!(status = %status, count, "job status breakdown");
    }

    Ok(())
}
