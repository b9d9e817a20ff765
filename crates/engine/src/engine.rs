use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, trace};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use hermes_core::{Attributes, AuctionId, AuctionSnapshot, Bid, BidSink, BidderId, LiveAuction};

use crate::error::{EngineError, Result};
use crate::report::{ReportSink, RunSummary};

/// Queue slots per auction when no explicit capacity is configured.
const DEFAULT_QUEUE_SLOTS_PER_AUCTION: usize = 100;

/// Engine tuning knobs, consumed once at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of auctions created at startup. The table never grows or
    /// shrinks afterwards.
    pub auction_count: usize,
    /// How long auctions stay open after the engine is constructed.
    pub run_timeout: Duration,
    /// Bid queue capacity. When the queue is full, new bids are dropped
    /// rather than blocking the producer. `None` sizes the queue
    /// proportionally to the auction count.
    pub queue_capacity: Option<usize>,
    /// Informational attributes generated per auction.
    pub attribute_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auction_count: 40,
            run_timeout: Duration::from_secs(5),
            queue_capacity: None,
            attribute_count: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// One simulation run's engine.
///
/// Owns the fixed auction table, the bounded bid queue, and the worker
/// pool. An explicitly constructed instance with a bounded lifetime
/// (construct -> start -> shutdown -> report); independent engines can
/// coexist, e.g. in tests.
pub struct Engine {
    auctions: Arc<DashMap<AuctionId, Arc<LiveAuction>>>,
    /// Write side of the bid queue. Taken and dropped at shutdown, which
    /// is what stops ingestion and lets the workers drain out.
    queue_tx: RwLock<Option<mpsc::Sender<Bid>>>,
    /// Read side, handed to the worker pool at start.
    queue_rx: Mutex<Option<mpsc::Receiver<Bid>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    state: Mutex<RunState>,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    submitted: AtomicU64,
    dropped: AtomicU64,
}

impl Engine {
    /// Build the fixed auction table and the bid queue.
    pub fn new(config: EngineConfig) -> Self {
        let started_at = Utc::now();
        let deadline =
            started_at + chrono::Duration::milliseconds(config.run_timeout.as_millis() as i64);

        let capacity = config
            .queue_capacity
            .unwrap_or(config.auction_count.max(1) * DEFAULT_QUEUE_SLOTS_PER_AUCTION);
        let (queue_tx, queue_rx) = mpsc::channel(capacity);

        let auctions = Arc::new(DashMap::with_capacity(config.auction_count));
        for i in 0..config.auction_count {
            let id = AuctionId::new(format!("auction-{:04}", i + 1));
            let attributes = generate_attributes(config.attribute_count);
            auctions.insert(
                id.clone(),
                Arc::new(LiveAuction::new(id, attributes, started_at, deadline)),
            );
        }

        info!(
            "engine created: {} auctions, queue capacity {}, deadline {}",
            config.auction_count, capacity, deadline
        );

        Self {
            auctions,
            queue_tx: RwLock::new(Some(queue_tx)),
            queue_rx: Mutex::new(Some(queue_rx)),
            workers: Mutex::new(Vec::new()),
            state: Mutex::new(RunState::Idle),
            started_at,
            deadline,
            submitted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Ids of every auction, for handing to traffic producers.
    pub fn auction_ids(&self) -> Vec<AuctionId> {
        let mut ids: Vec<AuctionId> = self.auctions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Instant after which no auction admits bids.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Bids handed to `submit` so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Bids discarded because the queue was full or ingestion had stopped.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Copy out one auction's current state.
    pub fn snapshot(&self, id: &AuctionId) -> Option<AuctionSnapshot> {
        self.auctions.get(id).map(|auction| auction.snapshot())
    }

    /// Launch the worker pool.
    ///
    /// Each worker takes one bid at a time from the queue and routes it to
    /// its auction; O(1) lookup against the fixed table. Workers run until
    /// the queue is closed and drained by `shutdown`. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, worker_count: usize) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != RunState::Idle {
                return Err(EngineError::InvalidState(format!(
                    "start called while {:?}",
                    *state
                )));
            }
            *state = RunState::Running;
        }

        let queue_rx = self
            .queue_rx
            .lock()
            .take()
            .ok_or_else(|| EngineError::InvalidState("bid queue already taken".into()))?;
        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));

        let worker_count = worker_count.max(1);
        let mut workers = self.workers.lock();
        for worker in 0..worker_count {
            let queue_rx = queue_rx.clone();
            let auctions = self.auctions.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    // Only the dequeue is serialized; routing and the
                    // accept run outside the receiver lock.
                    let bid = { queue_rx.lock().await.recv().await };
                    let Some(bid) = bid else {
                        break;
                    };
                    route_bid(&auctions, bid);
                }
                trace!("worker {worker} stopped");
            }));
        }
        info!("{worker_count} bid workers started");
        Ok(())
    }

    /// Stop ingestion, drain the workers, then close every auction.
    ///
    /// Strictly ordered: the queue sender is dropped first so nothing new
    /// can be enqueued, the worker pool is joined so every in-flight
    /// `accept` has finished, and only then are the auctions closed. No
    /// bid can land in a closed auction.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != RunState::Running {
                return Err(EngineError::InvalidState(format!(
                    "shutdown called while {:?}",
                    *state
                )));
            }
            *state = RunState::Draining;
        }

        // (a) stop ingestion: dropping the sender closes the queue once
        // in-flight clones held by `submit` are gone.
        let sender = self.queue_tx.write().take();
        drop(sender);

        // (b) wait for the workers to drain whatever was already queued;
        // per-auction deadline checks reject anything that arrived late.
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        let worker_count = workers.len();
        for handle in workers {
            let _ = handle.await;
        }
        debug!("{worker_count} workers drained and joined");

        // (c) close every auction exactly once.
        let closed_at = Utc::now();
        for auction in self.auctions.iter() {
            auction.close(closed_at);
        }
        *self.state.lock() = RunState::Stopped;

        info!(
            "engine stopped: {} auctions closed, {} bids submitted, {} dropped",
            self.auctions.len(),
            self.submitted(),
            self.dropped()
        );
        Ok(())
    }

    /// Snapshot every auction and hand the results to `sink`.
    ///
    /// Only valid after `shutdown` has completed; by then every snapshot
    /// is stable. Record identifiers returned by the sink are collected
    /// into the summary, which is written last.
    pub fn generate_report(
        &self,
        sink: &mut dyn ReportSink,
        resource: serde_json::Value,
    ) -> Result<RunSummary> {
        if *self.state.lock() != RunState::Stopped {
            return Err(EngineError::InvalidState(
                "report requested before shutdown completed".into(),
            ));
        }

        let end = Utc::now();
        let mut summary = RunSummary::new(self.started_at, end, self.auctions.len(), resource);

        // Stable id order keeps report output comparable between runs.
        for id in self.auction_ids() {
            if let Some(auction) = self.auctions.get(&id) {
                let record = sink.write_auction(&auction.snapshot())?;
                summary.add_record(record);
            }
        }
        sink.write_summary(&summary)?;
        Ok(summary)
    }
}

impl BidSink for Engine {
    /// Stamp the arrival time and enqueue without blocking.
    ///
    /// Under overload the engine favors bounded memory and low latency
    /// over lossless ingestion: a full queue drops the bid silently, and
    /// so does a queue that has already stopped for shutdown.
    fn submit(&self, auction_id: AuctionId, bidder_id: BidderId, amount: Decimal) -> bool {
        self.submitted.fetch_add(1, Ordering::Relaxed);

        let sender = self.queue_tx.read().as_ref().cloned();
        let Some(sender) = sender else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let bid = Bid::new(auction_id, bidder_id, amount, Utc::now());
        match sender.try_send(bid) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("bid queue full, dropping bid");
                false
            }
        }
    }
}

/// Route one dequeued bid to its auction.
///
/// Unknown auction ids are an expected artifact of producer
/// misconfiguration or stale ids and are discarded without error.
fn route_bid(auctions: &DashMap<AuctionId, Arc<LiveAuction>>, bid: Bid) {
    let Some(auction) = auctions.get(&bid.auction_id) else {
        debug!("discarding bid for unknown auction {}", bid.auction_id);
        return;
    };
    if !auction.accept(bid) {
        trace!("discarding late bid for auction {}", auction.id());
    }
}

/// Informational per-auction attributes; placeholder content in the shape
/// downstream report consumers expect.
fn generate_attributes(count: usize) -> Attributes {
    (0..count)
        .map(|i| (format!("attr_{:02}", i + 1), serde_json::Value::from(i)))
        .collect()
}
