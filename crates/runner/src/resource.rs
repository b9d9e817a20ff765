//! Host resource capture.
//!
//! Black-box metadata recorded once per run and attached to the summary;
//! nothing in the engine interprets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How long the benchmark loop spins.
const BENCHMARK_WINDOW: Duration = Duration::from_millis(200);

/// Snapshot of the host the run executed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub num_cpu: usize,
    /// Arithmetic throughput over a short fixed window. Comparable only
    /// between runs of the same build.
    pub cpu_benchmark_score: u64,
    pub captured_at: DateTime<Utc>,
}

/// Capture the CPU count and a coarse benchmark score.
pub fn capture() -> ResourceMetadata {
    let captured_at = Utc::now();
    let num_cpu = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    ResourceMetadata {
        num_cpu,
        cpu_benchmark_score: run_cpu_benchmark(BENCHMARK_WINDOW),
        captured_at,
    }
}

fn run_cpu_benchmark(window: Duration) -> u64 {
    let mut ops: u64 = 0;
    let start = Instant::now();
    while start.elapsed() < window {
        for i in 0u64..1000 {
            ops = ops.wrapping_add(i * i);
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_counts_work() {
        assert!(run_cpu_benchmark(Duration::from_millis(10)) > 0);
    }

    #[test]
    fn test_capture_reports_at_least_one_cpu() {
        let metadata = capture();
        assert!(metadata.num_cpu >= 1);
        assert!(metadata.cpu_benchmark_score > 0);
    }
}
