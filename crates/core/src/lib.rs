//! Core types shared across the harvestline ingest pipeline
//!
//! This crate provides the foundational abstractions used by every stage
//! binary and by `harvestline-engine`:
//!
//! - **Domain**: the `Repository` entity and the job-status/category enums
//!   shared by all three job tables
//! - **Configuration**: layered TOML + environment configuration
//! - **Error handling**: a unified error type and `Result` alias

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod error;

pub use config::{
    BackfillConfig, Config, EngineConfig, GithubTokenTable, LlmConfig, RepoFilterConfig,
    StorageConfig, WorkerIdentity,
};
pub use domain::{
    Category, Classification, IngestMeta, JobStatus, RepoActivity, RepoSignals, Repository,
};
pub use error::{Error, Result, ResultExt};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
