//! Converts a raw GitHub search result into the pipeline's `Repository` entity.
//!
//! Groups fields into identity / signals / activity / raw snapshot / ingest
//! meta, with `readme_fetched`/`ai_classified` flattened to the top level
//! since they start false for every freshly-mapped repository.

use crate::client::SearchRepoItem;
use chrono::Utc;
use harvestline_core::domain::{IngestMeta, RepoActivity, RepoSignals, Repository};

pub fn map_repo(
    item: &SearchRepoItem,
    query: &str,
    bucket: &str,
    pipeline_version: &str,
) -> Repository {
    let search_snapshot = serde_json::json!({
        "id": item.id,
        "full_name": item.full_name,
        "name": item.name,
        "owner": item.owner.login,
        "html_url": item.html_url,
        "description": item.description,
        "topics": item.topics,
        "language": item.language,
        "stargazers_count": item.stargazers_count,
        "forks_count": item.forks_count,
        "created_at": item.created_at,
        "updated_at": item.updated_at,
        "pushed_at": item.pushed_at,
        "fork": item.fork,
        "archived": item.archived,
    });

    Repository {
        source: "github".to_string(),
        repo_id: item.id,
        full_name: item.full_name.clone(),
        owner: item.owner.login.clone(),
        url: item.html_url.clone(),
        signals: RepoSignals {
            stars: item.stargazers_count,
            forks: item.forks_count,
            language: item.language.clone(),
            is_fork: item.fork,
            has_topics: !item.topics.is_empty(),
        },
        activity: RepoActivity {
            created_at: item.created_at,
            updated_at: item.updated_at,
            pushed_at: item.pushed_at,
        },
        search_snapshot,
        ingest_meta: IngestMeta {
            bucket: bucket.to_string(),
            query: query.to_string(),
            ingested_at: Utc::now(),
            pipeline_version: pipeline_version.to_string(),
        },
        readme_fetched: false,
        readme_content: None,
        readme_updated_at: None,
        ai_classified: false,
        classified_at: None,
        classification: None,
    }
}
