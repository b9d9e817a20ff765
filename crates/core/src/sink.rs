use rust_decimal::Decimal;

use crate::{AuctionId, BidderId};

/// Port through which traffic producers hand bids to the engine.
///
/// Producers only construct (auction, bidder, amount); the arrival time is
/// stamped by the implementation at enqueue time. Returns `false` when the
/// bid was not enqueued because ingestion has stopped or the queue was
/// full. Both are admission-control outcomes, not errors, and the producer
/// is expected to move on.
pub trait BidSink: Send + Sync {
    fn submit(&self, auction_id: AuctionId, bidder_id: BidderId, amount: Decimal) -> bool;
}
