//! Simulated bidder behaviour.
//!
//! A bidder decides per auction whether to respond, with what amount, and
//! after how much think time. All decisions are drawn up front from a
//! seedable RNG so a given seed always produces the same plan.

use rand::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::time::Duration;

use hermes_core::{AuctionId, BidderId};

/// Configuration for a simulated bidder.
#[derive(Debug, Clone)]
pub struct BidderConfig {
    /// Probability of responding to any given auction (0-1).
    pub response_probability: f64,
    /// Shortest think time before a bid goes out.
    pub min_delay: Duration,
    /// Longest think time before a bid goes out.
    pub max_delay: Duration,
    /// Lower bound of the uniform amount range.
    pub min_amount: Decimal,
    /// Upper bound of the uniform amount range.
    pub max_amount: Decimal,
    /// Random seed (for reproducibility).
    pub seed: Option<u64>,
}

impl Default for BidderConfig {
    fn default() -> Self {
        Self {
            response_probability: 0.85,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(800),
            min_amount: Decimal::ONE,
            max_amount: Decimal::ONE_HUNDRED,
            seed: None,
        }
    }
}

/// One bid this bidder intends to place after a think delay.
#[derive(Debug, Clone)]
pub struct PlannedBid {
    pub auction_id: AuctionId,
    pub amount: Decimal,
    pub delay: Duration,
}

/// A simulated bidder with configurable behaviour.
pub struct Bidder {
    id: BidderId,
    config: BidderConfig,
    rng: StdRng,
}

impl Bidder {
    pub fn new(id: impl Into<String>, config: BidderConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            id: BidderId::new(id),
            config,
            rng,
        }
    }

    /// Create `n` bidders whose individual seeds derive deterministically
    /// from `master_seed`.
    pub fn fleet(n: usize, master_seed: u64) -> Vec<Bidder> {
        let mut master = StdRng::seed_from_u64(master_seed);
        (0..n)
            .map(|i| {
                let config = BidderConfig {
                    seed: Some(master.next_u64()),
                    ..BidderConfig::default()
                };
                Bidder::new(format!("bidder-{:03}", i + 1), config)
            })
            .collect()
    }

    pub fn id(&self) -> &BidderId {
        &self.id
    }

    /// Decide, for every auction, whether this bidder responds and with
    /// what amount and think delay.
    pub fn plan(&mut self, auction_ids: &[AuctionId]) -> Vec<PlannedBid> {
        let mut planned = Vec::new();
        for auction_id in auction_ids {
            if self.rng.r#gen::<f64>() > self.config.response_probability {
                continue; // sits this one out
            }
            planned.push(PlannedBid {
                auction_id: auction_id.clone(),
                amount: self.draw_amount(),
                delay: self.draw_delay(),
            });
        }
        planned
    }

    fn draw_amount(&mut self) -> Decimal {
        let span = self.config.max_amount - self.config.min_amount;
        let fraction = Decimal::from_f64(self.rng.r#gen::<f64>()).unwrap_or(Decimal::ZERO);
        (self.config.min_amount + span * fraction).round_dp(2)
    }

    fn draw_delay(&mut self) -> Duration {
        if self.config.max_delay <= self.config.min_delay {
            return self.config.min_delay;
        }
        self.rng.gen_range(self.config.min_delay..self.config.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn auction_ids(n: usize) -> Vec<AuctionId> {
        (1..=n)
            .map(|i| AuctionId::new(format!("auction-{i:04}")))
            .collect()
    }

    #[test]
    fn test_same_seed_same_plan() {
        let config = BidderConfig {
            seed: Some(12345),
            ..BidderConfig::default()
        };
        let ids = auction_ids(20);

        let plan_a = Bidder::new("bidder-001", config.clone()).plan(&ids);
        let plan_b = Bidder::new("bidder-002", config).plan(&ids);

        assert_eq!(plan_a.len(), plan_b.len());
        for (a, b) in plan_a.iter().zip(&plan_b) {
            assert_eq!(a.auction_id, b.auction_id);
            assert_eq!(a.amount, b.amount);
            assert_eq!(a.delay, b.delay);
        }
    }

    #[test]
    fn test_zero_probability_never_bids() {
        let config = BidderConfig {
            response_probability: 0.0,
            seed: Some(42),
            ..BidderConfig::default()
        };
        let mut bidder = Bidder::new("bidder-001", config);

        assert!(bidder.plan(&auction_ids(50)).is_empty());
    }

    #[test]
    fn test_full_probability_bids_everywhere_within_range() {
        let config = BidderConfig {
            response_probability: 1.0,
            min_amount: dec!(5),
            max_amount: dec!(10),
            seed: Some(42),
            ..BidderConfig::default()
        };
        let mut bidder = Bidder::new("bidder-001", config.clone());
        let ids = auction_ids(50);

        let planned = bidder.plan(&ids);
        assert_eq!(planned.len(), ids.len());
        for bid in &planned {
            assert!(bid.amount >= config.min_amount && bid.amount <= config.max_amount);
            assert!(bid.delay >= config.min_delay && bid.delay < config.max_delay);
        }
    }

    #[test]
    fn test_fleet_is_deterministic_and_distinct() {
        let ids = auction_ids(10);

        let plans_a: Vec<_> = Bidder::fleet(5, 99).iter_mut().map(|b| b.plan(&ids)).collect();
        let plans_b: Vec<_> = Bidder::fleet(5, 99).iter_mut().map(|b| b.plan(&ids)).collect();

        for (a, b) in plans_a.iter().zip(&plans_b) {
            assert_eq!(a.len(), b.len());
        }
        // different bidders draw from different child seeds
        let amounts_first: Vec<_> = plans_a[0].iter().map(|p| p.amount).collect();
        let amounts_second: Vec<_> = plans_a[1].iter().map(|p| p.amount).collect();
        assert_ne!(amounts_first, amounts_second);
    }
}
