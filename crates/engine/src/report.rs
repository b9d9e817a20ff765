use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use hermes_core::AuctionSnapshot;

use crate::error::Result;

/// Aggregate outcome of one simulation run.
///
/// Built once at report time and append-only while the per-auction
/// records are being emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: f64,
    pub auction_count: usize,
    /// Opaque resource/benchmark metadata captured by the host process.
    pub resource: serde_json::Value,
    /// Identifiers of the per-auction records emitted with this summary.
    pub auctions: Vec<String>,
}

impl RunSummary {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        auction_count: usize,
        resource: serde_json::Value,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            start,
            end,
            duration_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
            auction_count,
            resource,
            auctions: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record_id: String) {
        self.auctions.push(record_id);
    }
}

/// Sink for finalized auction snapshots and the run summary.
///
/// `write_auction` returns the identifier of the record it produced; the
/// engine collects those into the summary. A write failure aborts report
/// generation with no partial-report cleanup.
pub trait ReportSink {
    fn write_auction(&mut self, snapshot: &AuctionSnapshot) -> Result<String>;
    fn write_summary(&mut self, summary: &RunSummary) -> Result<()>;
}

/// Writes one JSON file per auction plus `global_summary.json` into a
/// directory.
pub struct JsonDirectorySink {
    dir: PathBuf,
}

impl JsonDirectorySink {
    /// File name of the aggregate summary record.
    pub const SUMMARY_FILE: &'static str = "global_summary.json";

    /// Create the sink, creating `dir` if needed. Failing here aborts the
    /// run before any auction starts.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let file = File::create(self.dir.join(name))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportSink for JsonDirectorySink {
    fn write_auction(&mut self, snapshot: &AuctionSnapshot) -> Result<String> {
        let record_id = format!("{}.json", snapshot.auction_id);
        self.write_json(&record_id, snapshot)?;
        Ok(record_id)
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<()> {
        self.write_json(Self::SUMMARY_FILE, summary)?;
        info!(
            "run summary written to {}",
            self.dir.join(Self::SUMMARY_FILE).display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hermes_core::{Attributes, AuctionId, Bid, BidderId, LiveAuction};
    use rust_decimal_macros::dec;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hermes-report-{tag}-{}", Uuid::new_v4()))
    }

    fn closed_auction() -> LiveAuction {
        let started = Utc::now();
        let deadline = started + Duration::hours(1);
        let auction = LiveAuction::new(
            AuctionId::from("auction-0007"),
            Attributes::new(),
            started,
            deadline,
        );
        auction.accept(Bid::new(
            AuctionId::from("auction-0007"),
            BidderId::from("alice"),
            dec!(12.50),
            started + Duration::seconds(1),
        ));
        auction.close(deadline);
        auction
    }

    #[test]
    fn test_json_sink_round_trips_records() {
        let dir = temp_dir("roundtrip");
        let mut sink = JsonDirectorySink::create(&dir).unwrap();

        let snapshot = closed_auction().snapshot();
        let record = sink.write_auction(&snapshot).unwrap();
        assert_eq!(record, "auction-0007.json");

        let mut summary = RunSummary::new(
            Utc::now() - Duration::seconds(5),
            Utc::now(),
            1,
            serde_json::json!({"num_cpu": 8}),
        );
        summary.add_record(record.clone());
        sink.write_summary(&summary).unwrap();

        let raw = std::fs::read_to_string(dir.join(&record)).unwrap();
        let read_back: AuctionSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(read_back.auction_id, snapshot.auction_id);
        assert_eq!(read_back.bids.len(), 1);
        assert_eq!(read_back.winner.unwrap().bidder_id.as_str(), "alice");

        let raw = std::fs::read_to_string(dir.join(JsonDirectorySink::SUMMARY_FILE)).unwrap();
        let read_back: RunSummary = serde_json::from_str(&raw).unwrap();
        assert_eq!(read_back.run_id, summary.run_id);
        assert_eq!(read_back.auctions, vec![record]);
        assert!(read_back.duration_seconds >= 4.9);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_sink_creation_fails_on_unusable_path() {
        // a plain file where the directory should go
        let path = temp_dir("blocked");
        std::fs::write(&path, b"not a directory").unwrap();

        assert!(JsonDirectorySink::create(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_failed_write_propagates() {
        let dir = temp_dir("vanishing");
        let mut sink = JsonDirectorySink::create(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let snapshot = closed_auction().snapshot();
        assert!(sink.write_auction(&snapshot).is_err());
    }
}
