//! Full run orchestration.
//!
//! One `AuctionSimulation` owns one run: construct the engine, launch the
//! traffic, sleep out the deadline, shut down in order, then report.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hermes_bidder::{Bidder, spawn_traffic};
use hermes_core::BidSink;
use hermes_engine::{Engine, EngineConfig, JsonDirectorySink, Result, RunSummary};

use crate::resource;

/// Process-level configuration, consumed before the engine is constructed
/// and never re-read during the run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of concurrent auctions.
    pub auctions: usize,
    /// Number of simulated bidders.
    pub bidders: usize,
    /// How long the auctions stay open.
    pub timeout: Duration,
    /// Worker tasks draining the bid queue.
    pub workers: usize,
    /// Bid queue capacity override; `None` scales with the auction count.
    pub queue_capacity: Option<usize>,
    /// Where per-auction records and the summary land.
    pub output_dir: PathBuf,
    /// Master seed for bidder behaviour.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            auctions: 40,
            bidders: 100,
            timeout: Duration::from_secs(5),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            queue_capacity: None,
            output_dir: PathBuf::from("outputs"),
            seed: 42,
        }
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResults {
    pub summary: RunSummary,
    /// Bids offered to the engine.
    pub submitted: u64,
    /// Bids refused by admission control.
    pub dropped: u64,
}

/// One full auction simulation run.
pub struct AuctionSimulation {
    config: SimulationConfig,
}

impl AuctionSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run to completion and produce the report.
    pub async fn run(self) -> Result<SimulationResults> {
        let config = self.config;

        // Output destination first: failing to create it aborts the run
        // before any auction starts.
        let mut sink = JsonDirectorySink::create(&config.output_dir)?;

        let resource = resource::capture();
        info!(
            "resources: {} cpus, benchmark score {}",
            resource.num_cpu, resource.cpu_benchmark_score
        );

        let engine = Arc::new(Engine::new(EngineConfig {
            auction_count: config.auctions,
            run_timeout: config.timeout,
            queue_capacity: config.queue_capacity,
            ..EngineConfig::default()
        }));
        engine.start(config.workers)?;

        let bidders = Bidder::fleet(config.bidders, config.seed);
        let auction_ids = engine.auction_ids();
        let bid_sink: Arc<dyn BidSink> = engine.clone();
        let producers = spawn_traffic(bidders, &auction_ids, bid_sink);
        info!(
            "{} bidders spawned {} bid tasks against {} auctions",
            config.bidders,
            producers.len(),
            auction_ids.len()
        );

        tokio::time::sleep(config.timeout).await;
        engine.shutdown().await?;

        // Producers still sleeping past the deadline have nothing left to
        // do; their submits would be refused anyway.
        for handle in &producers {
            handle.abort();
        }

        let resource_json = serde_json::to_value(&resource)?;
        let summary = engine.generate_report(&mut sink, resource_json)?;

        if engine.dropped() > 0 {
            warn!("{} bids dropped by admission control", engine.dropped());
        }
        info!(
            "run {} complete: {} auctions reported in {:.2}s",
            summary.run_id, summary.auction_count, summary.duration_seconds
        );

        Ok(SimulationResults {
            submitted: engine.submitted(),
            dropped: engine.dropped(),
            summary,
        })
    }
}
