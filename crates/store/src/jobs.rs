//! Generic job-table primitives shared by all three pipeline stages.
//!
//! Every stage's job table has the same bookkeeping columns (`status`,
//! `attempts`, `max_attempts`, timestamps) plus a JSONB `payload` and an
//! optional `repo_id` used as both natural key and partition key. This
//! module implements the atomic claim protocol once, against whichever
//! table the caller names, instead of duplicating the `FOR UPDATE SKIP
//! LOCKED` CTE three times. Table names come only from `JobStage`, never
//! from caller input, so interpolating them into SQL carries no injection
//! risk.

use chrono::{DateTime, Utc};
use harvestline_core::error::{Error, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Which job table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Search,
    Readme,
    Classify,
}

impl JobStage {
    fn table(self) -> &'static str {
        match self {
            JobStage::Search => "search_jobs",
            JobStage::Readme => "readme_jobs",
            JobStage::Classify => "classify_jobs",
        }
    }
}

/// A job row claimed off the queue, ready for the stage's `process_job`.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub attempts: i32,
    pub max_attempts: i32,
    pub repo_id: Option<i64>,
    pub payload: serde_json::Value,
}

#[derive(Clone)]
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new job in `pending`, keyed by `natural_key` (the table's
    /// unique index). Returns `false` without erroring on a duplicate, so a
    /// generator sweep can report "skipped" rather than fail outright.
    pub async fn enqueue(
        &self,
        stage: JobStage,
        repo_id: Option<i64>,
        natural_key: &serde_json::Value,
        payload: &serde_json::Value,
        max_attempts: i32,
    ) -> Result<bool> {
        let table = stage.table();
        let query = format!(
            "INSERT INTO {table} (id, status, attempts, max_attempts, repo_id, natural_key, payload, created_at, updated_at)
             VALUES (gen_random_uuid(), 'pending', 0, $1, $2, $3, $4, NOW(), NOW())
             ON CONFLICT (natural_key) DO NOTHING"
        );

        let result = sqlx::query(&query)
            .bind(max_attempts)
            .bind(repo_id)
            .bind(natural_key)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to enqueue {table} job: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomically claims up to `batch_size` pending jobs, transitioning
    /// each to `running` and incrementing `attempts` in the same statement.
    /// `partition` restricts the claim to rows where `repo_id %
    /// total_workers == worker_id - 1`, used by the README stage to shard
    /// work without coordination.
    pub async fn claim_batch(
        &self,
        stage: JobStage,
        batch_size: i64,
        partition: Option<(u32, u32)>,
    ) -> Result<Vec<ClaimedJob>> {
        let table = stage.table();

        let partition_clause = if partition.is_some() {
            " AND repo_id IS NOT NULL AND repo_id % $2 = $3"
        } else {
            ""
        };

        let query = format!(
            "WITH claimed AS (
                SELECT id FROM {table}
                WHERE status = 'pending' AND attempts < max_attempts{partition_clause}
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT $1
             )
             UPDATE {table} t
             SET status = 'running', attempts = attempts + 1, started_at = NOW(), updated_at = NOW()
             FROM claimed
             WHERE t.id = claimed.id
             RETURNING t.id, t.attempts, t.max_attempts, t.repo_id, t.payload"
        );

        let mut q = sqlx::query(&query).bind(batch_size);
        if let Some((worker_id, total_workers)) = partition {
            q = q
                .bind(total_workers as i64)
                .bind((worker_id as i64) - 1);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to claim {table} jobs: {e}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(ClaimedJob {
                    id: row
                        .try_get("id")
                        .map_err(|e| Error::store(format!("missing id column: {e}")))?,
                    attempts: row
                        .try_get("attempts")
                        .map_err(|e| Error::store(format!("missing attempts column: {e}")))?,
                    max_attempts: row
                        .try_get("max_attempts")
                        .map_err(|e| Error::store(format!("missing max_attempts column: {e}")))?,
                    repo_id: row
                        .try_get("repo_id")
                        .map_err(|e| Error::store(format!("missing repo_id column: {e}")))?,
                    payload: row
                        .try_get("payload")
                        .map_err(|e| Error::store(format!("missing payload column: {e}")))?,
                })
            })
            .collect()
    }

    pub async fn mark_done(
        &self,
        stage: JobStage,
        id: Uuid,
        result_payload: Option<serde_json::Value>,
    ) -> Result<()> {
        let table = stage.table();
        let query = format!(
            "UPDATE {table}
             SET status = 'done', completed_at = NOW(), updated_at = NOW(), error_message = NULL,
                 payload = COALESCE($2, payload)
             WHERE id = $1"
        );

        sqlx::query(&query)
            .bind(id)
            .bind(result_payload)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to mark {table} job {id} done: {e}")))?;

        Ok(())
    }

    /// README-only terminal status for repositories with no README content,
    /// so they are never retried by a future generator sweep.
    pub async fn mark_no_readme(&self, id: Uuid) -> Result<()> {
        let table = JobStage::Readme.table();
        sqlx::query(&format!(
            "UPDATE {table}
             SET status = 'no_readme', completed_at = NOW(), updated_at = NOW(), error_message = $2
             WHERE id = $1"
        ))
        .bind(id)
        .bind("No README found")
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to mark readme job {id} no_readme: {e}")))?;

        Ok(())
    }

    /// Records a failure. Transitions to `failed` (terminal) once `attempts
    /// >= max_attempts`, otherwise back to `pending` for another worker to
    /// retry — the same attempts-aware branch as `_mark_job_failed`.
    pub async fn mark_failed_or_retry(
        &self,
        stage: JobStage,
        id: Uuid,
        attempts: i32,
        max_attempts: i32,
        error_message: &str,
    ) -> Result<()> {
        let table = stage.table();
        if attempts >= max_attempts {
            sqlx::query(&format!(
                "UPDATE {table}
                 SET status = 'failed', completed_at = NOW(), updated_at = NOW(), error_message = $2
                 WHERE id = $1"
            ))
            .bind(id)
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to mark {table} job {id} failed: {e}")))?;
        } else {
            sqlx::query(&format!(
                "UPDATE {table}
                 SET status = 'pending', updated_at = NOW(), error_message = $2
                 WHERE id = $1"
            ))
            .bind(id)
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to requeue {table} job {id}: {e}")))?;
        }

        Ok(())
    }

    /// Reverts a rate-limited job to `pending`, explicitly decrementing
    /// `attempts` so the claim that triggered the rate limit doesn't count
    /// against the job's retry budget.
    pub async fn revert_for_rate_limit(
        &self,
        stage: JobStage,
        id: Uuid,
        reset_at: DateTime<Utc>,
    ) -> Result<()> {
        let table = stage.table();
        sqlx::query(&format!(
            "UPDATE {table}
             SET status = 'pending', attempts = GREATEST(attempts - 1, 0), updated_at = NOW(),
                 error_message = $2
             WHERE id = $1"
        ))
        .bind(id)
        .bind(format!("rate limited, resets at {reset_at}"))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to revert {table} job {id}: {e}")))?;

        Ok(())
    }

    /// Reverts every job still in `running` back to `pending`, unconditionally.
    /// Run once at process startup, before this stage claims anything new, so
    /// a worker that crashed mid-job never leaves rows stuck unclaimable.
    pub async fn cleanup_stale(&self, stage: JobStage) -> Result<u64> {
        let table = stage.table();
        let result = sqlx::query(&format!(
            "UPDATE {table}
             SET status = 'pending', updated_at = NOW(),
                 error_message = 'reclaimed from stale running state'
             WHERE status = 'running'"
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to clean up stale {table} jobs: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Reverts a single held-but-unprocessed job back to `pending` without
    /// touching `attempts`, used when a worker loop shuts down mid-batch.
    pub async fn release_held(&self, stage: JobStage, id: Uuid) -> Result<()> {
        let table = stage.table();
        sqlx::query(&format!(
            "UPDATE {table}
             SET status = 'pending', updated_at = NOW()
             WHERE id = $1 AND status = 'running'"
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to release held {table} job {id}: {e}")))?;

        Ok(())
    }

    /// Count of jobs still in `pending` or `running`, used by the
    /// orchestrator's auto-exit check.
    pub async fn count_active(&self, stage: JobStage) -> Result<i64> {
        let table = stage.table();
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS count FROM {table} WHERE status IN ('pending', 'running')"
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to count active {table} jobs: {e}")))?;

        row.try_get::<i64, _>("count")
            .map_err(|e| Error::store(format!("missing count column: {e}")))
    }

    /// Per-status row counts, the Postgres equivalent of
    /// `print_job_status`'s `$group` aggregation.
    pub async fn count_by_status(&self, stage: JobStage) -> Result<Vec<(String, i64)>> {
        let table = stage.table();
        let rows = sqlx::query(&format!(
            "SELECT status, COUNT(*) AS count FROM {table} GROUP BY status ORDER BY status"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to count {table} jobs by status: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let status: String = row
                    .try_get("status")
                    .map_err(|e| Error::store(format!("missing status column: {e}")))?;
                let count: i64 = row
                    .try_get("count")
                    .map_err(|e| Error::store(format!("missing count column: {e}")))?;
                Ok((status, count))
            })
            .collect()
    }
}
