//! Hermes Engine
//!
//! Concurrent bid ingestion and auction orchestration: a fixed table of
//! auctions, a bounded bid queue, a worker pool that drains the queue,
//! and the ordered shutdown that finalizes every auction exactly once.
//!
//! ```text
//! producers --> bounded queue --> worker pool --> per-auction lock
//!                                                      |  (shutdown)
//!                                                      v
//!                                        snapshots --> report sink
//! ```

mod engine;
mod error;
mod report;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, Result};
pub use report::{JsonDirectorySink, ReportSink, RunSummary};
