// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod batch;
pub mod bootstrap;
pub mod config;
pub mod judge;
pub mod metrics;
pub mod query;
pub mod report;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::batch::{run_batch, BatchRow};
pub use crate::judge::{build_judge_client, DynJudgeClient, JudgeClient, JudgeError, Judgment};
pub use crate::scoring::{batch_ccp, single_ccp, ScoreResult};
