// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod dedup;
pub mod ingest;
pub mod pipeline;
pub mod publish;
pub mod store;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::config::BotConfig;
pub use crate::dedup::{DedupGate, GateConfig, GateDecision};
pub use crate::ingest::types::{CandidateItem, FeedSource};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::store::{SeenSet, StateStore};
