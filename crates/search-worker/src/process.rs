//! Search stage: turn one date-windowed query into `repositories` rows.
//!
//! Substitute the window into the query template, page through search
//! results, filter, map, bulk insert, report how many rows were actually
//! new.

use async_trait::async_trait;
use harvestline_core::config::RepoFilterConfig;
use harvestline_core::error::Error;
use harvestline_engine::{StageWorker, WorkerOutcome};
use harvestline_github_client::{map_repo, GithubClient, RepoFilter};
use harvestline_store::{ClaimedJob, JobStage, RepositoryStore};

const PER_PAGE: u32 = 50;
const MAX_PAGES: u32 = 10;

pub struct SearchStageWorker {
    github: GithubClient,
    repos: RepositoryStore,
    filter_config: RepoFilterConfig,
    pipeline_version: String,
}

impl SearchStageWorker {
    pub fn new(
        github: GithubClient,
        repos: RepositoryStore,
        filter_config: RepoFilterConfig,
        pipeline_version: String,
    ) -> Self {
        Self {
            github,
            repos,
            filter_config,
            pipeline_version,
        }
    }
}

#[async_trait]
impl StageWorker for SearchStageWorker {
    fn stage(&self) -> JobStage {
        JobStage::Search
    }

    async fn process(&self, job: &ClaimedJob) -> WorkerOutcome {
        match self.try_process(job).await {
            Ok(outcome) => outcome,
            Err(Error::RateLimited { reset_at }) => {
                let reset_at = chrono::DateTime::from_timestamp(reset_at, 0)
                    .unwrap_or_else(chrono::Utc::now);
                WorkerOutcome::RateLimited(reset_at)
            }
            Err(e) => WorkerOutcome::Failed(e.to_string()),
        }
    }
}

impl SearchStageWorker {
    async fn try_process(&self, job: &ClaimedJob) -> harvestline_core::error::Result<WorkerOutcome> {
        let bucket = payload_str(&job.payload, "bucket")?;
        let query_template = payload_str(&job.payload, "query_template")?;
        let window_from = payload_str(&job.payload, "window_from")?;
        let window_to = payload_str(&job.payload, "window_to")?;

        let query = query_template
            .replace("{from_date}", &window_from)
            .replace("{to_date}", &window_to);

        tracing::info!(job_id = %job.id, %query, "processing search job");

        let filter = RepoFilter::new(&self.filter_config);
        let mut inserted: i64 = 0;
        let mut page = 1;

        loop {
            let result = self.github.search_repositories(&query, page).await?;
            tracing::info!(
                job_id = %job.id,
                total_count = result.total_count,
                page,
                "search page fetched"
            );

            if result.repos.is_empty() {
                break;
            }

            for item in &result.repos {
                if !filter.is_valid(
                    &item.name,
                    item.stargazers_count,
                    item.size,
                    item.fork,
                    item.archived,
                    item.pushed_at,
                ) {
                    continue;
                }

                let repo = map_repo(item, &query, &bucket, &self.pipeline_version);
                if self.repos.insert_if_absent(&repo).await? {
                    inserted += 1;
                }
            }

            if result.repos.len() < PER_PAGE as usize || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        tracing::info!(job_id = %job.id, inserted, "search job collected repos");

        Ok(WorkerOutcome::Done(Some(
            serde_json::json!({ "repos_count": inserted }),
        )))
    }
}

fn payload_str(payload: &serde_json::Value, field: &str) -> harvestline_core::error::Result<String> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("search job payload missing '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_str_reads_present_field() {
        let payload = serde_json::json!({"bucket": "github_2024_q1"});
        assert_eq!(payload_str(&payload, "bucket").expect("field present"), "github_2024_q1");
    }

    #[test]
    fn payload_str_errors_on_missing_field() {
        let payload = serde_json::json!({});
        assert!(payload_str(&payload, "bucket").is_err());
    }
}
