//! Configuration module for the harvestline ingest pipeline
//!
//! Configuration is loaded from an optional TOML file overlaid by
//! environment variables.

mod defaults;
mod loading;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use defaults::*;

/// Postgres connection parameters for the shared document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_user")]
    pub postgres_user: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,
}

impl StorageConfig {
    /// Render as a `postgres://` connection string consumable by `sqlx`.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.postgres_user,
            self.postgres_password,
            self.postgres_host,
            self.postgres_port,
            self.postgres_database
        )
    }
}

/// Identity of this worker process within the partitioned fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerIdentity {
    #[serde(default = "default_worker_id")]
    pub worker_id: u32,

    #[serde(default = "default_total_workers")]
    pub total_workers: u32,
}

/// Per-worker GitHub token table, keyed by `worker_id`.
///
/// Loaded from config (`GITHUB_TOKEN_1`, `GITHUB_TOKEN_2`, ...), with
/// `worker_id=1`'s token as the fallback.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GithubTokenTable {
    pub tokens: std::collections::BTreeMap<u32, String>,
}

impl GithubTokenTable {
    pub fn token_for(&self, worker_id: u32) -> Option<&str> {
        self.tokens
            .get(&worker_id)
            .or_else(|| self.tokens.get(&1))
            .map(String::as_str)
    }
}

/// Parameters for the search stage's backfill job generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,

    #[serde(default = "default_query_template")]
    pub query_template: String,

    #[serde(default = "default_start_date")]
    pub start_date: String,

    #[serde(default = "default_end_date")]
    pub end_date: String,

    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

/// Repo-level quality filter thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFilterConfig {
    #[serde(default = "default_min_stars")]
    pub min_stars: i64,

    #[serde(default = "default_min_size_kb")]
    pub min_size_kb: i64,

    #[serde(default = "default_max_pushed_at_days")]
    pub max_pushed_at_days: i64,

    #[serde(default = "default_blacklist_keywords")]
    pub blacklist_name_keywords: Vec<String>,
}

fn default_blacklist_keywords() -> Vec<String> {
    vec![
        "awesome".to_string(),
        "tutorial".to_string(),
        "example".to_string(),
        "course".to_string(),
        "bootcamp".to_string(),
        "roadmap".to_string(),
    ]
}

/// LLM provider configuration for the classify stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,

    #[serde(default = "default_llm_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_readme_max_chars")]
    pub readme_max_chars: usize,
}

/// Job-engine-wide tunables shared by all three stage workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_readme_batch_size")]
    pub readme_batch_size: i64,

    #[serde(default)]
    pub auto_exit: bool,
}

/// Top-level pipeline configuration, assembled by each binary's `main`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub worker: WorkerIdentity,
    pub github_tokens: GithubTokenTable,
    pub backfill: BackfillConfig,
    pub repo_filter: RepoFilterConfig,
    pub llm: LlmConfig,
    pub engine: EngineConfig,

    #[serde(default = "default_pipeline_version")]
    pub pipeline_version: String,
}

pub use loading::load_config;
