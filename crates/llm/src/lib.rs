//! LLM client for the classify stage.
//!
//! A single OpenAI-compatible chat-completion client (`LlmClient`), plus the
//! prompt/response handling that turns a README into a [`Classification`].

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod classify;
mod client;

pub use classify::classify_readme;
pub use client::LlmClient;
