//! Persistence for the `repositories` table.
//!
//! A thin struct wrapping a pool, one inherent method per access pattern,
//! each query inlined rather than built dynamically.

use chrono::{DateTime, Utc};
use harvestline_core::domain::{Classification, IngestMeta, RepoActivity, RepoSignals, Repository};
use harvestline_core::error::{Error, Result};
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct RepositoryStore {
    pool: PgPool,
}

impl RepositoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a repository discovered by the search stage, or leaves the
    /// existing row untouched if `repo_id` was already ingested.
    ///
    /// The search stage never overwrites an existing repository: the signal
    /// snapshot is intentionally immutable once stored.
    pub async fn insert_if_absent(&self, repo: &Repository) -> Result<bool> {
        let signals = serde_json::to_value(&repo.signals)
            .map_err(|e| Error::store(format!("failed to serialize signals: {e}")))?;
        let activity = serde_json::to_value(&repo.activity)
            .map_err(|e| Error::store(format!("failed to serialize activity: {e}")))?;
        let ingest_meta = serde_json::to_value(&repo.ingest_meta)
            .map_err(|e| Error::store(format!("failed to serialize ingest_meta: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO repositories (
                repo_id, source, full_name, owner, url,
                signals, activity, search_snapshot, ingest_meta,
                readme_fetched, ai_classified, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, false, NOW(), NOW())
             ON CONFLICT (repo_id) DO NOTHING",
        )
        .bind(repo.repo_id)
        .bind(&repo.source)
        .bind(&repo.full_name)
        .bind(&repo.owner)
        .bind(&repo.url)
        .bind(signals)
        .bind(activity)
        .bind(&repo.search_snapshot)
        .bind(ingest_meta)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to insert repository: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get(&self, repo_id: i64) -> Result<Option<Repository>> {
        let row = sqlx::query(
            "SELECT repo_id, source, full_name, owner, url, signals, activity,
                    search_snapshot, ingest_meta, readme_fetched, readme_content,
                    readme_updated_at, ai_classified, classified_at, classification
             FROM repositories WHERE repo_id = $1",
        )
        .bind(repo_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to fetch repository {repo_id}: {e}")))?;

        row.map(row_to_repository).transpose()
    }

    /// Records a successfully fetched README, forward-only: a repo already
    /// marked `readme_fetched` is never reverted by a later claim.
    pub async fn mark_readme_fetched(
        &self,
        repo_id: i64,
        content: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE repositories
             SET readme_fetched = true, readme_content = $2, readme_updated_at = $3, updated_at = NOW()
             WHERE repo_id = $1",
        )
        .bind(repo_id)
        .bind(content)
        .bind(fetched_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to record readme for {repo_id}: {e}")))?;

        Ok(())
    }

    /// Records that a repository has no README, without ever storing content.
    pub async fn mark_no_readme(&self, repo_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE repositories
             SET readme_fetched = true, readme_content = NULL, readme_updated_at = NOW(), updated_at = NOW()
             WHERE repo_id = $1",
        )
        .bind(repo_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to mark no-readme for {repo_id}: {e}")))?;

        Ok(())
    }

    pub async fn mark_classified(
        &self,
        repo_id: i64,
        classification: &Classification,
        classified_at: DateTime<Utc>,
    ) -> Result<()> {
        let classification_json = serde_json::to_value(classification)
            .map_err(|e| Error::store(format!("failed to serialize classification: {e}")))?;

        sqlx::query(
            "UPDATE repositories
             SET ai_classified = true, classification = $2, classified_at = $3, updated_at = NOW()
             WHERE repo_id = $1",
        )
        .bind(repo_id)
        .bind(classification_json)
        .bind(classified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to record classification for {repo_id}: {e}")))?;

        Ok(())
    }

    /// Repositories with no README yet and no outstanding readme job,
    /// the README generator's source of new work.
    pub async fn find_repos_needing_readme(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query(
            "SELECT r.repo_id, r.full_name FROM repositories r
             WHERE NOT r.readme_fetched
               AND NOT EXISTS (SELECT 1 FROM readme_jobs j WHERE j.repo_id = r.repo_id)
             ORDER BY r.repo_id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to find repos needing readme: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let repo_id: i64 = row
                    .try_get("repo_id")
                    .map_err(|e| Error::store(format!("missing repo_id column: {e}")))?;
                let full_name: String = row
                    .try_get("full_name")
                    .map_err(|e| Error::store(format!("missing full_name column: {e}")))?;
                Ok((repo_id, full_name))
            })
            .collect()
    }

    /// Repositories with a README but not yet classified and no outstanding
    /// classify job, the classify generator's source of new work.
    pub async fn find_repos_needing_classification(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query(
            "SELECT r.repo_id, r.full_name FROM repositories r
             WHERE r.readme_fetched AND NOT r.ai_classified
               AND NOT EXISTS (SELECT 1 FROM classify_jobs j WHERE j.repo_id = r.repo_id)
             ORDER BY r.repo_id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::store(format!("failed to find repos needing classification: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let repo_id: i64 = row
                    .try_get("repo_id")
                    .map_err(|e| Error::store(format!("missing repo_id column: {e}")))?;
                let full_name: String = row
                    .try_get("full_name")
                    .map_err(|e| Error::store(format!("missing full_name column: {e}")))?;
                Ok((repo_id, full_name))
            })
            .collect()
    }

    /// Fetches the README content for a repository, for the classify stage.
    pub async fn get_readme_content(&self, repo_id: i64) -> Result<Option<String>> {
        let row = sqlx::query("SELECT readme_content FROM repositories WHERE repo_id = $1")
            .bind(repo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::store(format!("failed to fetch readme for {repo_id}: {e}")))?;

        row.map(|row| {
            row.try_get("readme_content")
                .map_err(|e| Error::store(format!("missing readme_content column: {e}")))
        })
        .transpose()
    }

    /// Truncates every table, for local/dev resets (mirrors `drop_all_data`).
    pub async fn drop_all_data(&self) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::store(format!("failed to begin transaction: {e}")))?;

        for table in ["classify_jobs", "readme_jobs", "search_jobs", "repositories"] {
            sqlx::query(&format!("TRUNCATE TABLE {table} CASCADE"))
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::store(format!("failed to truncate {table}: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::store(format!("failed to commit transaction: {e}")))?;

        tracing::info!("dropped all data from postgres tables");
        Ok(())
    }
}

fn row_to_repository(row: sqlx::postgres::PgRow) -> Result<Repository> {
    let signals_json: serde_json::Value = row
        .try_get("signals")
        .map_err(|e| Error::store(format!("failed to read signals column: {e}")))?;
    let activity_json: serde_json::Value = row
        .try_get("activity")
        .map_err(|e| Error::store(format!("failed to read activity column: {e}")))?;
    let ingest_meta_json: serde_json::Value = row
        .try_get("ingest_meta")
        .map_err(|e| Error::store(format!("failed to read ingest_meta column: {e}")))?;
    let classification_json: Option<serde_json::Value> = row
        .try_get("classification")
        .map_err(|e| Error::store(format!("failed to read classification column: {e}")))?;

    let signals: RepoSignals = serde_json::from_value(signals_json)
        .map_err(|e| Error::store(format!("failed to deserialize signals: {e}")))?;
    let activity: RepoActivity = serde_json::from_value(activity_json)
        .map_err(|e| Error::store(format!("failed to deserialize activity: {e}")))?;
    let ingest_meta: IngestMeta = serde_json::from_value(ingest_meta_json)
        .map_err(|e| Error::store(format!("failed to deserialize ingest_meta: {e}")))?;
    let classification = classification_json
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| Error::store(format!("failed to deserialize classification: {e}")))?;

    Ok(Repository {
        source: row
            .try_get("source")
            .map_err(|e| Error::store(format!("failed to read source column: {e}")))?,
        repo_id: row
            .try_get("repo_id")
            .map_err(|e| Error::store(format!("failed to read repo_id column: {e}")))?,
        full_name: row
            .try_get("full_name")
            .map_err(|e| Error::store(format!("failed to read full_name column: {e}")))?,
        owner: row
            .try_get("owner")
            .map_err(|e| Error::store(format!("failed to read owner column: {e}")))?,
        url: row
            .try_get("url")
            .map_err(|e| Error::store(format!("failed to read url column: {e}")))?,
        signals,
        activity,
        search_snapshot: row
            .try_get("search_snapshot")
            .map_err(|e| Error::store(format!("failed to read search_snapshot column: {e}")))?,
        ingest_meta,
        readme_fetched: row
            .try_get("readme_fetched")
            .map_err(|e| Error::store(format!("failed to read readme_fetched column: {e}")))?,
        readme_content: row
            .try_get("readme_content")
            .map_err(|e| Error::store(format!("failed to read readme_content column: {e}")))?,
        readme_updated_at: row
            .try_get("readme_updated_at")
            .map_err(|e| Error::store(format!("failed to read readme_updated_at column: {e}")))?,
        ai_classified: row
            .try_get("ai_classified")
            .map_err(|e| Error::store(format!("failed to read ai_classified column: {e}")))?,
        classified_at: row
            .try_get("classified_at")
            .map_err(|e| Error::store(format!("failed to read classified_at column: {e}")))?,
        classification,
    })
}
