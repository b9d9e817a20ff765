use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Attributes, AuctionId, Bid};

/// Lifecycle state of an auction. Transitions Open -> Closed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Open,
    Closed,
}

/// Immutable copy of one auction's state.
///
/// Safe to hand to reporting while other auctions are still mutating:
/// nothing in here aliases the live auction's storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub auction_id: AuctionId,
    pub attributes: Attributes,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Admitted bids in admission order.
    pub bids: Vec<Bid>,
    pub winner: Option<Bid>,
    pub status: AuctionStatus,
}

/// Mutable auction state, only touched under the entity lock.
#[derive(Debug)]
struct AuctionState {
    /// Append-only admission history.
    bids: Vec<Bid>,
    /// Index into `bids` of the current winner.
    winner: Option<usize>,
    closed_at: Option<DateTime<Utc>>,
    status: AuctionStatus,
}

/// One auction while the simulation is running.
///
/// All mutation goes through the entity's own lock, so concurrent bids for
/// the same auction are fully serialized while unrelated auctions never
/// contend with each other.
#[derive(Debug)]
pub struct LiveAuction {
    id: AuctionId,
    attributes: Attributes,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    state: Mutex<AuctionState>,
}

impl LiveAuction {
    pub fn new(
        id: AuctionId,
        attributes: Attributes,
        started_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            attributes,
            started_at,
            deadline,
            state: Mutex::new(AuctionState {
                bids: Vec::new(),
                winner: None,
                closed_at: None,
                status: AuctionStatus::Open,
            }),
        }
    }

    pub fn id(&self) -> &AuctionId {
        &self.id
    }

    /// Last instant at which a bid can still be admitted.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Admit `bid` if it arrived at or before the deadline.
    ///
    /// Late bids are an expected, frequent outcome and are discarded
    /// silently; the return value only says whether the bid was recorded.
    /// The append and the winner update happen under one lock acquisition,
    /// so a concurrent `snapshot` never observes a recorded bid without a
    /// consistent winner.
    pub fn accept(&self, bid: Bid) -> bool {
        if bid.arrival_time > self.deadline {
            return false;
        }
        let mut state = self.state.lock();
        if state.status == AuctionStatus::Closed {
            return false;
        }

        let candidate = state.bids.len();
        state.bids.push(bid);
        let displaced = match state.winner {
            None => true,
            // Strict outrank only: a bid tying on amount and arrival does
            // not displace the current winner.
            Some(current) => state.bids[candidate].outranks(&state.bids[current]),
        };
        if displaced {
            state.winner = Some(candidate);
        }
        true
    }

    /// Mark the auction closed and record when.
    ///
    /// The engine calls this exactly once per auction, after every worker
    /// has joined; the lock still makes it safe against an in-flight
    /// `accept` holding the entity.
    pub fn close(&self, at: DateTime<Utc>) {
        let mut state = self.state.lock();
        state.status = AuctionStatus::Closed;
        state.closed_at = Some(at);
    }

    /// Copy out the current state.
    pub fn snapshot(&self) -> AuctionSnapshot {
        let state = self.state.lock();
        AuctionSnapshot {
            auction_id: self.id.clone(),
            attributes: self.attributes.clone(),
            started_at: self.started_at,
            deadline: self.deadline,
            closed_at: state.closed_at,
            bids: state.bids.clone(),
            winner: state.winner.map(|i| state.bids[i].clone()),
            status: state.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BidderId;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn open_auction(deadline: DateTime<Utc>) -> LiveAuction {
        let started = deadline - Duration::hours(1);
        LiveAuction::new(AuctionId::from("auction-0001"), Attributes::new(), started, deadline)
    }

    fn bid(auction: &LiveAuction, bidder: &str, amount: Decimal, arrival: DateTime<Utc>) -> Bid {
        Bid::new(auction.id().clone(), BidderId::from(bidder), amount, arrival)
    }

    #[test]
    fn test_earliest_of_equal_top_amounts_wins() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);

        assert!(auction.accept(bid(&auction, "alice", dec!(100), deadline - Duration::minutes(50))));
        assert!(auction.accept(bid(&auction, "bob", dec!(150), deadline - Duration::minutes(40))));
        assert!(auction.accept(bid(&auction, "charlie", dec!(150), deadline - Duration::minutes(55))));

        let snapshot = auction.snapshot();
        assert_eq!(snapshot.bids.len(), 3);
        let winner = snapshot.winner.expect("auction has bids");
        assert_eq!(winner.bidder_id.as_str(), "charlie");
        assert_eq!(winner.amount, dec!(150));
    }

    #[test]
    fn test_late_bid_changes_nothing() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);

        assert!(!auction.accept(bid(&auction, "alice", dec!(100), deadline + Duration::minutes(1))));

        let snapshot = auction.snapshot();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.winner.is_none());
    }

    #[test]
    fn test_bid_exactly_at_deadline_is_admitted() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);

        assert!(auction.accept(bid(&auction, "alice", dec!(10), deadline)));
        assert_eq!(auction.snapshot().bids.len(), 1);
    }

    #[test]
    fn test_higher_amount_always_displaces() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);
        let now = Utc::now();

        auction.accept(bid(&auction, "alice", dec!(10), now));
        auction.accept(bid(&auction, "bob", dec!(10.01), now + Duration::seconds(1)));

        let winner = auction.snapshot().winner.unwrap();
        assert_eq!(winner.bidder_id.as_str(), "bob");
    }

    #[test]
    fn test_equal_amount_and_time_does_not_displace() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);
        let now = Utc::now();

        auction.accept(bid(&auction, "alice", dec!(75), now));
        auction.accept(bid(&auction, "bob", dec!(75), now));
        auction.accept(bid(&auction, "carol", dec!(75), now + Duration::seconds(1)));

        let snapshot = auction.snapshot();
        assert_eq!(snapshot.bids.len(), 3);
        assert_eq!(snapshot.winner.unwrap().bidder_id.as_str(), "alice");
    }

    #[test]
    fn test_winner_tracks_max_amount() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);
        let now = Utc::now();

        for (i, amount) in [dec!(3), dec!(9), dec!(1), dec!(9), dec!(4)].iter().enumerate() {
            auction.accept(bid(
                &auction,
                &format!("bidder-{i}"),
                *amount,
                now + Duration::seconds(i as i64),
            ));
        }

        let snapshot = auction.snapshot();
        let max = snapshot.bids.iter().map(|b| b.amount).max().unwrap();
        let winner = snapshot.winner.unwrap();
        assert_eq!(winner.amount, max);
        // first of the tied 9s
        assert_eq!(winner.bidder_id.as_str(), "bidder-1");
    }

    #[test]
    fn test_close_freezes_the_auction() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);
        let now = Utc::now();

        assert!(auction.accept(bid(&auction, "alice", dec!(20), now)));
        auction.close(now + Duration::seconds(1));

        // in time for the deadline, but the auction is closed
        assert!(!auction.accept(bid(&auction, "bob", dec!(30), now + Duration::seconds(2))));

        let snapshot = auction.snapshot();
        assert_eq!(snapshot.status, AuctionStatus::Closed);
        assert!(snapshot.closed_at.is_some());
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.winner.unwrap().bidder_id.as_str(), "alice");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let deadline = Utc::now() + Duration::hours(1);
        let auction = open_auction(deadline);
        let now = Utc::now();

        auction.accept(bid(&auction, "alice", dec!(5), now));
        let before = auction.snapshot();
        auction.accept(bid(&auction, "bob", dec!(6), now + Duration::seconds(1)));

        assert_eq!(before.bids.len(), 1);
        assert_eq!(auction.snapshot().bids.len(), 2);
    }
}
