use super::*;
use std::io::Write as _;

fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("HARVESTLINE_")
            || key.starts_with("GITHUB_TOKEN_")
            || [
                "WORKER_ID",
                "TOTAL_WORKERS",
                "BUCKET_PREFIX",
                "QUERY_TEMPLATE",
                "START_DATE",
                "END_DATE",
                "WINDOW_DAYS",
                "GITHUB_INGEST_PIPELINE_VERSION",
                "OPENAI_API_KEY",
                "POSTGRES_HOST",
                "POSTGRES_DATABASE",
                "POSTGRES_USER",
                "POSTGRES_PASSWORD",
                "POSTGRES_PORT",
            ]
            .contains(&key.as_str())
        {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn loads_defaults_with_no_file_and_no_env() {
    clear_env();
    std::env::set_var("OPENAI_API_KEY", "test-key");

    let cfg = load_config(None).expect("default config should load");

    assert_eq!(cfg.worker.worker_id, 1);
    assert_eq!(cfg.worker.total_workers, 1);
    assert_eq!(cfg.storage.postgres_host, "localhost");
    assert_eq!(cfg.llm.api_key, "test-key");
    assert_eq!(cfg.pipeline_version, "github_ingest_v1");

    clear_env();
}

#[test]
fn flat_env_vars_override_defaults() {
    clear_env();
    std::env::set_var("OPENAI_API_KEY", "test-key");
    std::env::set_var("WORKER_ID", "3");
    std::env::set_var("TOTAL_WORKERS", "8");
    std::env::set_var("GITHUB_TOKEN_3", "ghp_worker3");
    std::env::set_var("GITHUB_TOKEN_1", "ghp_worker1");

    let cfg = load_config(None).expect("config should load with overrides");

    assert_eq!(cfg.worker.worker_id, 3);
    assert_eq!(cfg.worker.total_workers, 8);
    assert_eq!(cfg.github_tokens.token_for(3), Some("ghp_worker3"));
    // Unassigned worker ids fall back to worker 1's token.
    assert_eq!(cfg.github_tokens.token_for(7), Some("ghp_worker1"));

    clear_env();
}

#[test]
fn file_source_is_applied_before_env_overrides() {
    clear_env();
    std::env::set_var("OPENAI_API_KEY", "test-key");

    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        r#"
        [storage]
        postgres_host = "file-host"

        [worker]
        worker_id = 5
        "#
    )
    .unwrap();

    let cfg = load_config(Some(file.path())).expect("config should load from file");
    assert_eq!(cfg.storage.postgres_host, "file-host");
    assert_eq!(cfg.worker.worker_id, 5);

    clear_env();
}
