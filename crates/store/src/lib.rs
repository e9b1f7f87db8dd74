//! Postgres-backed document store for the harvestline pipeline.
//!
//! Two pieces: [`repository_store`] holds the enriched `repositories` row,
//! [`jobs`] implements the atomic claim protocol shared by all three job
//! tables. Both are thin wrappers over a `sqlx::PgPool` — one inherent
//! method per query, no ORM, no schema-less document abstraction.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod jobs;
pub mod pool;
pub mod repository_store;

pub use jobs::{ClaimedJob, JobStage, JobStore};
pub use pool::{connect, run_migrations};
pub use repository_store::RepositoryStore;
