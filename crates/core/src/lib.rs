//! Hermes Core Domain
//!
//! Pure domain types for the Hermes auction simulator: ids, bids, the
//! live auction entity, and the sink port through which traffic producers
//! reach the engine. This crate contains no async and no I/O.

mod auction;
mod bid;
mod ids;
mod sink;

pub use auction::{AuctionSnapshot, AuctionStatus, LiveAuction};
pub use bid::Bid;
pub use ids::{AuctionId, BidderId};
pub use sink::BidSink;

/// Opaque per-auction attributes, informational only.
pub type Attributes = std::collections::HashMap<String, serde_json::Value>;
