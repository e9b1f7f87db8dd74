//! Default values and functions for configuration

pub(crate) const DEFAULT_POSTGRES_HOST: &str = "localhost";
pub(crate) const DEFAULT_POSTGRES_DATABASE: &str = "harvestline";
pub(crate) const DEFAULT_POSTGRES_USER: &str = "harvestline";
pub(crate) const DEFAULT_POSTGRES_PASSWORD: &str = "harvestline";
pub(crate) const DEFAULT_PIPELINE_VERSION: &str = "github_ingest_v1";
pub(crate) const DEFAULT_BUCKET_PREFIX: &str = "ml_repos";
pub(crate) const DEFAULT_QUERY_TEMPLATE: &str = "created:{from_date}..{to_date} stars:>20";
pub(crate) const DEFAULT_START_DATE: &str = "2022-01-01";
pub(crate) const DEFAULT_END_DATE: &str = "2024-12-31";
pub(crate) const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub(crate) const DEFAULT_LLM_API_BASE_URL: &str = "https://api.openai.com/v1";

pub(crate) fn default_postgres_host() -> String {
    DEFAULT_POSTGRES_HOST.to_string()
}

pub(crate) fn default_postgres_port() -> u16 {
    5432
}

pub(crate) fn default_postgres_database() -> String {
    DEFAULT_POSTGRES_DATABASE.to_string()
}

pub(crate) fn default_postgres_user() -> String {
    DEFAULT_POSTGRES_USER.to_string()
}

pub(crate) fn default_postgres_password() -> String {
    DEFAULT_POSTGRES_PASSWORD.to_string()
}

pub(crate) fn default_worker_id() -> u32 {
    1
}

pub(crate) fn default_total_workers() -> u32 {
    1
}

pub(crate) fn default_pipeline_version() -> String {
    DEFAULT_PIPELINE_VERSION.to_string()
}

pub(crate) fn default_bucket_prefix() -> String {
    DEFAULT_BUCKET_PREFIX.to_string()
}

pub(crate) fn default_query_template() -> String {
    DEFAULT_QUERY_TEMPLATE.to_string()
}

pub(crate) fn default_start_date() -> String {
    DEFAULT_START_DATE.to_string()
}

pub(crate) fn default_end_date() -> String {
    DEFAULT_END_DATE.to_string()
}

pub(crate) fn default_window_days() -> i64 {
    3
}

pub(crate) fn default_min_stars() -> i64 {
    20
}

pub(crate) fn default_min_size_kb() -> i64 {
    50
}

pub(crate) fn default_max_pushed_at_days() -> i64 {
    30
}

pub(crate) fn default_readme_batch_size() -> i64 {
    10_000
}

pub(crate) fn default_max_attempts() -> i32 {
    3
}

pub(crate) fn default_poll_interval_secs() -> u64 {
    10
}

pub(crate) fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

pub(crate) fn default_llm_api_base_url() -> String {
    DEFAULT_LLM_API_BASE_URL.to_string()
}

pub(crate) fn default_llm_temperature() -> f32 {
    0.3
}

pub(crate) fn default_llm_timeout_secs() -> u64 {
    120
}

pub(crate) fn default_readme_max_chars() -> usize {
    2000
}
