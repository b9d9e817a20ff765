//! Hermes Runner - Concurrent Auction Simulation
//!
//! Wires the whole run together:
//!
//! - **Resource**: host metadata captured once per run
//! - **Simulation**: construct -> start -> traffic -> deadline ->
//!   shutdown -> report
//!
//! ```text
//! ┌──────────────┐   submit    ┌───────────────────────────┐
//! │  Bid Traffic │ ──────────▶ │          Engine           │
//! │  (bidders)   │             │  queue ─▶ workers ─▶ lock │
//! └──────────────┘             └─────────────┬─────────────┘
//!                                            │ snapshots
//!                                            ▼
//!                              ┌───────────────────────────┐
//!                              │        Report Sink        │
//!                              │  records + run summary    │
//!                              └───────────────────────────┘
//! ```

pub mod resource;
pub mod simulation;

// Re-export main types
pub use resource::ResourceMetadata;
pub use simulation::{AuctionSimulation, SimulationConfig, SimulationResults};
