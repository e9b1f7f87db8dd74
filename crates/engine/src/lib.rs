//! Stage-agnostic pipeline engine: job generation, the claim/process loop,
//! process bootstrap, and graceful shutdown. Each stage binary crate
//! supplies only its [`worker::StageWorker`] implementation and generator
//! wiring; everything else here is shared.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod generator;
pub mod orchestrator;
pub mod shutdown;
pub mod worker;

pub use generator::{
    ClassifyJobGenerator, GenerateSummary, JobGenerator, ReadmeJobGenerator, SearchJobGenerator,
};
pub use orchestrator::bootstrap;
pub use shutdown::on_shutdown_signal;
pub use worker::{run_worker_loop, StageWorker, WorkerLoopConfig, WorkerOutcome, WorkerStats};
