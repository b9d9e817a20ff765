use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidderId};

/// One admission request against a single auction.
///
/// Immutable once created. `arrival_time` is stamped by the engine at
/// enqueue time, so ordering reflects ingestion order rather than
/// producer wall-clock skew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    pub amount: Decimal,
    pub arrival_time: DateTime<Utc>,
}

impl Bid {
    pub fn new(
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: Decimal,
        arrival_time: DateTime<Utc>,
    ) -> Self {
        Self {
            auction_id,
            bidder_id,
            amount,
            arrival_time,
        }
    }

    /// Whether this bid strictly outranks `other` under the winner order:
    /// higher amount wins, equal amounts go to the earlier arrival.
    /// A bid tying on both amount and arrival does not outrank.
    pub fn outranks(&self, other: &Bid) -> bool {
        self.amount > other.amount
            || (self.amount == other.amount && self.arrival_time < other.arrival_time)
    }
}
