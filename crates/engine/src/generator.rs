//! Job generators: turn pipeline state into new `pending` rows.
//!
//! One generator per stage: search generates from a fixed date range,
//! README and classify generate from repository state that has drifted
//! ahead of their stage.

use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use harvestline_core::config::BackfillConfig;
use harvestline_core::error::{Error, Result};
use harvestline_store::{JobStage, JobStore, RepositoryStore};

/// Outcome of one generator sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateSummary {
    pub enqueued: u64,
    pub skipped_duplicate: u64,
}

impl GenerateSummary {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.enqueued += 1;
        } else {
            self.skipped_duplicate += 1;
        }
    }
}

#[async_trait]
pub trait JobGenerator: Send + Sync {
    async fn generate(&self) -> Result<GenerateSummary>;
}

/// Splits `[start_date, end_date)` into `window_days`-sized buckets and
/// enqueues one `search_jobs` row per window, keyed by `(bucket,
/// window_from, window_to)`.
pub struct SearchJobGenerator {
    store: JobStore,
    config: BackfillConfig,
    max_attempts: i32,
}

impl SearchJobGenerator {
    pub fn new(store: JobStore, config: BackfillConfig, max_attempts: i32) -> Self {
        Self {
            store,
            config,
            max_attempts,
        }
    }
}

#[async_trait]
impl JobGenerator for SearchJobGenerator {
    async fn generate(&self) -> Result<GenerateSummary> {
        let start = NaiveDate::parse_from_str(&self.config.start_date, "%Y-%m-%d")
            .map_err(|e| Error::config(format!("invalid backfill start_date: {e}")))?;
        let end = NaiveDate::parse_from_str(&self.config.end_date, "%Y-%m-%d")
            .map_err(|e| Error::config(format!("invalid backfill end_date: {e}")))?;

        let mut summary = GenerateSummary::default();
        let mut current = start;

        while current < end {
            let window_end = (current + ChronoDuration::days(self.config.window_days)).min(end);

            let bucket = bucket_name(&self.config.bucket_prefix, current);

            let window_from = current.format("%Y-%m-%d").to_string();
            let window_to = window_end.format("%Y-%m-%d").to_string();

            let natural_key = serde_json::json!({
                "bucket": bucket,
                "window_from": window_from,
                "window_to": window_to,
            });
            let payload = serde_json::json!({
                "bucket": bucket,
                "query_template": self.config.query_template,
                "window_from": window_from,
                "window_to": window_to,
            });

            let inserted = self
                .store
                .enqueue(JobStage::Search, None, &natural_key, &payload, self.max_attempts)
                .await?;
            summary.record(inserted);

            current = window_end + ChronoDuration::days(1);
        }

        tracing::info!(
            "search job generation: {} enqueued, {} skipped (already present)",
            summary.enqueued,
            summary.skipped_duplicate
        );

        Ok(summary)
    }
}

/// `{prefix}_{year}_q{quarter}`, the same bucket-per-quarter naming as the
/// original generator's `bucket = f"{bucket_prefix}_{year}_q{quarter}"`.
fn bucket_name(prefix: &str, date: NaiveDate) -> String {
    let quarter = (date.month() - 1) / 3 + 1;
    format!("{prefix}_{}_q{quarter}", date.year())
}

/// Enqueues a `readme_jobs` row for every repository not yet fetched.
pub struct ReadmeJobGenerator {
    jobs: JobStore,
    repos: RepositoryStore,
    batch_size: i64,
    max_attempts: i32,
}

impl ReadmeJobGenerator {
    pub fn new(jobs: JobStore, repos: RepositoryStore, batch_size: i64, max_attempts: i32) -> Self {
        Self {
            jobs,
            repos,
            batch_size,
            max_attempts,
        }
    }
}

#[async_trait]
impl JobGenerator for ReadmeJobGenerator {
    async fn generate(&self) -> Result<GenerateSummary> {
        let candidates = self.repos.find_repos_needing_readme(self.batch_size).await?;
        let mut summary = GenerateSummary::default();

        for (repo_id, full_name) in candidates {
            let natural_key = serde_json::json!({ "repo_id": repo_id });
            let payload = serde_json::json!({ "repo_id": repo_id, "full_name": full_name });
            let inserted = self
                .jobs
                .enqueue(
                    JobStage::Readme,
                    Some(repo_id),
                    &natural_key,
                    &payload,
                    self.max_attempts,
                )
                .await?;
            summary.record(inserted);
        }

        tracing::info!(
            "readme job generation: {} enqueued, {} skipped",
            summary.enqueued,
            summary.skipped_duplicate
        );

        Ok(summary)
    }
}

/// Enqueues a `classify_jobs` row for every repository with a README but no
/// classification yet.
pub struct ClassifyJobGenerator {
    jobs: JobStore,
    repos: RepositoryStore,
    batch_size: i64,
    max_attempts: i32,
}

impl ClassifyJobGenerator {
    pub fn new(jobs: JobStore, repos: RepositoryStore, batch_size: i64, max_attempts: i32) -> Self {
        Self {
            jobs,
            repos,
            batch_size,
            max_attempts,
        }
    }
}

#[async_trait]
impl JobGenerator for ClassifyJobGenerator {
    async fn generate(&self) -> Result<GenerateSummary> {
        let candidates = self
            .repos
            .find_repos_needing_classification(self.batch_size)
            .await?;
        let mut summary = GenerateSummary::default();

        for (repo_id, full_name) in candidates {
            let natural_key = serde_json::json!({ "repo_id": repo_id });
            let payload = serde_json::json!({ "repo_id": repo_id, "full_name": full_name });
            let inserted = self
                .jobs
                .enqueue(
                    JobStage::Classify,
                    Some(repo_id),
                    &natural_key,
                    &payload,
                    self.max_attempts,
                )
                .await?;
            summary.record(inserted);
        }

        tracing::info!(
            "classify job generation: {} enqueued, {} skipped",
            summary.enqueued,
            summary.skipped_duplicate
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_name_uses_year_and_quarter() {
        let d = NaiveDate::from_ymd_opt(2022, 4, 10).expect("valid date");
        assert_eq!(bucket_name("github", d), "github_2022_q2");
    }

    #[test]
    fn bucket_name_rolls_over_at_quarter_boundaries() {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date");
        assert_eq!(bucket_name("github", jan), "github_2023_q1");
        assert_eq!(bucket_name("github", dec), "github_2023_q4");
    }
}
