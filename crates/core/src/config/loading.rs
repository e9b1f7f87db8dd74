//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, Environment, File};
use std::path::Path;

use super::{
    BackfillConfig, Config, EngineConfig, GithubTokenTable, LlmConfig, RepoFilterConfig,
    StorageConfig, WorkerIdentity,
};

/// Loads configuration from an optional TOML file with environment variable
/// overrides.
///
/// Structured fields use `HARVESTLINE_` prefixed, double-underscore-nested
/// environment variables (e.g. `HARVESTLINE_STORAGE__POSTGRES_HOST`). A set
/// of flat, single-purpose environment variables (`WORKER_ID`,
/// `TOTAL_WORKERS`, `BUCKET_PREFIX`, `QUERY_TEMPLATE`, `START_DATE`,
/// `END_DATE`, `WINDOW_DAYS`, `GITHUB_INGEST_PIPELINE_VERSION`,
/// `OPENAI_API_KEY`, `GITHUB_TOKEN_<n>`) are layered on top as explicit
/// overrides, matching how operators actually configure each worker
/// process.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut builder = ConfigLib::builder();

    if let Some(path) = path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("HARVESTLINE")
            .separator("__")
            .try_parsing(true),
    );

    macro_rules! set_override {
        ($builder:expr, $key:expr, $env:expr) => {
            if let Ok(val) = std::env::var($env) {
                $builder = $builder
                    .set_override($key, val)
                    .map_err(|e| Error::config(format!("failed to set {}: {e}", $key)))?;
            }
        };
    }

    set_override!(builder, "worker.worker_id", "WORKER_ID");
    set_override!(builder, "worker.total_workers", "TOTAL_WORKERS");
    set_override!(builder, "backfill.bucket_prefix", "BUCKET_PREFIX");
    set_override!(builder, "backfill.query_template", "QUERY_TEMPLATE");
    set_override!(builder, "backfill.start_date", "START_DATE");
    set_override!(builder, "backfill.end_date", "END_DATE");
    set_override!(builder, "backfill.window_days", "WINDOW_DAYS");
    set_override!(
        builder,
        "pipeline_version",
        "GITHUB_INGEST_PIPELINE_VERSION"
    );
    set_override!(builder, "llm.api_key", "OPENAI_API_KEY");
    set_override!(builder, "storage.postgres_host", "POSTGRES_HOST");
    set_override!(builder, "storage.postgres_database", "POSTGRES_DATABASE");
    set_override!(builder, "storage.postgres_user", "POSTGRES_USER");
    set_override!(builder, "storage.postgres_password", "POSTGRES_PASSWORD");
    if let Ok(port) = std::env::var("POSTGRES_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder
                .set_override("storage.postgres_port", port_num as i64)
                .map_err(|e| Error::config(format!("failed to set POSTGRES_PORT: {e}")))?;
        }
    }

    let raw = builder
        .build()
        .map_err(|e| Error::config(format!("failed to build config: {e}")))?;

    let storage: StorageConfig = raw
        .get("storage")
        .map_err(|e| Error::config(format!("invalid storage config: {e}")))?;
    let worker: WorkerIdentity = raw
        .get("worker")
        .map_err(|e| Error::config(format!("invalid worker config: {e}")))?;
    let backfill: BackfillConfig = raw
        .get("backfill")
        .map_err(|e| Error::config(format!("invalid backfill config: {e}")))?;
    let repo_filter: RepoFilterConfig = raw
        .get("repo_filter")
        .map_err(|e| Error::config(format!("invalid repo_filter config: {e}")))?;
    let llm: LlmConfig = raw
        .get("llm")
        .map_err(|e| Error::config(format!("invalid llm config: {e}")))?;
    let engine: EngineConfig = raw
        .get("engine")
        .map_err(|e| Error::config(format!("invalid engine config: {e}")))?;
    let pipeline_version: String = raw
        .get("pipeline_version")
        .unwrap_or_else(|_| super::defaults::default_pipeline_version());

    let github_tokens = load_github_token_table();

    Ok(Config {
        storage,
        worker,
        github_tokens,
        backfill,
        repo_filter,
        llm,
        engine,
        pipeline_version,
    })
}

/// Reads `GITHUB_TOKEN_1`, `GITHUB_TOKEN_2`, ... up to a generous ceiling,
/// since the number of tokens is determined by `TOTAL_WORKERS`, not a fixed
/// compile-time constant.
fn load_github_token_table() -> GithubTokenTable {
    let mut tokens = std::collections::BTreeMap::new();
    for worker_id in 1..=256u32 {
        if let Ok(token) = std::env::var(format!("GITHUB_TOKEN_{worker_id}")) {
            tokens.insert(worker_id, token);
        }
    }
    GithubTokenTable { tokens }
}
