//! GitHub REST API client for the search and README stages.
//!
//! Three pieces: [`client`] only talks HTTP, [`filter`] is pure repo/README
//! heuristics, [`mapper`] turns a raw search hit into a
//! [`harvestline_core::domain::Repository`].

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod client;
mod filter;
mod mapper;

pub use client::{GithubClient, RepoOwner, SearchPage, SearchRepoItem};
pub use filter::{is_meaningful_readme, RepoFilter};
pub use mapper::map_repo;
