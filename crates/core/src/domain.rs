//! Shared domain types for the repository-enrichment pipeline.
//!
//! These types describe the `repositories` table and the common job header
//! every stage's job table shares. Stage-specific payloads live in
//! `harvestline-engine`, next to the generator/worker code that owns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a job row, shared verbatim across all three stages.
///
/// `NoReadme` is only ever reached by the README stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
    NoReadme,
}

/// The closed set of categories a classified repository may belong to.
///
/// Any LLM response naming a category outside this set is coerced to
/// `Other` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WebFramework,
    DataScience,
    MlAi,
    Cli,
    Testing,
    Database,
    Http,
    Devtools,
    Auth,
    Messaging,
    Cloud,
    Ui,
    Validation,
    Logging,
    Networking,
    Other,
}

impl Category {
    /// Parse a category name from the LLM, coercing anything unrecognized to `Other`.
    pub fn coerce(raw: &str) -> Self {
        raw.parse().unwrap_or(Category::Other)
    }
}

/// The structured verdict written by the classify stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub is_library: bool,
    pub category: Category,
    pub confidence: f64,
    pub reason: String,
}

/// Cheap, frequently-refreshed signals about a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSignals {
    pub stars: i64,
    pub forks: i64,
    pub language: Option<String>,
    pub is_fork: bool,
    pub has_topics: bool,
}

/// Repo-reported activity timestamps, distinct from the row's own bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoActivity {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
}

/// Pipeline provenance recorded at ingest time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMeta {
    pub bucket: String,
    pub query: String,
    pub ingested_at: DateTime<Utc>,
    pub pipeline_version: String,
}

/// The enriched Repository entity, unique by `repo_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub source: String,
    pub repo_id: i64,
    pub full_name: String,
    pub owner: String,
    pub url: String,

    pub signals: RepoSignals,
    pub activity: RepoActivity,

    /// Immutable capture of the search result, kept for reproducibility.
    pub search_snapshot: serde_json::Value,
    pub ingest_meta: IngestMeta,

    pub readme_fetched: bool,
    pub readme_content: Option<String>,
    pub readme_updated_at: Option<DateTime<Utc>>,

    pub ai_classified: bool,
    pub classified_at: Option<DateTime<Utc>>,
    pub classification: Option<Classification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_coerces_unknown_to_other() {
        assert_eq!(Category::coerce("quantum"), Category::Other);
        assert_eq!(Category::coerce("ml_ai"), Category::MlAi);
        assert_eq!(Category::coerce("CLI"), Category::Cli);
    }

    #[test]
    fn job_status_round_trips_through_strings() {
        assert_eq!("pending".parse::<JobStatus>().unwrap(), JobStatus::Pending);
        assert_eq!(JobStatus::NoReadme.to_string(), "no_readme");
    }
}
