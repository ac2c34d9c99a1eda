//! Results of completed benchmark runs

use crate::{
    models::Sample,
    stats::{self, LatencySummary},
    types::Protocol,
};
use serde::Serialize;
use std::time::Duration;

/// Sequential run: successful samples in issue order, failures dropped
#[derive(Debug, Clone, Serialize)]
pub struct LatencyRun {
    pub protocol: Protocol,
    pub limit: u32,
    pub requested: u32,
    pub samples: Vec<Sample>,
    pub failures: u32,
    pub elapsed: Duration,
    pub summary: Option<LatencySummary>,
}

impl LatencyRun {
    pub fn new(protocol: Protocol, limit: u32, requested: u32, samples: Vec<Sample>, failures: u32, elapsed: Duration) -> Self {
        let summary = LatencySummary::from_samples(&samples);
        Self { protocol, limit, requested, samples, failures, elapsed, summary }
    }

    pub fn latencies_ms(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::elapsed_ms).collect()
    }

    pub fn mean_ms(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.mean_ms)
    }

    /// Percentage of issued requests that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.requested as f64 * 100.0
        }
    }
}

/// Fixed-window run of concurrent batches
#[derive(Debug, Clone, Serialize)]
pub struct ThroughputRun {
    pub protocol: Protocol,
    pub limit: u32,
    pub window: Duration,
    pub batch_size: u32,
    pub batches: u32,
    pub successes: u64,
    pub failures: u64,
    /// Actual wall-clock time, including the last batch to finish
    pub elapsed: Duration,
    pub requests_per_second: f64,
}

impl ThroughputRun {
    pub fn new(
        protocol: Protocol,
        limit: u32,
        window: Duration,
        batch_size: u32,
        batches: u32,
        successes: u64,
        failures: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            protocol,
            limit,
            window,
            batch_size,
            batches,
            successes,
            failures,
            elapsed,
            requests_per_second: stats::throughput_rate(successes, elapsed),
        }
    }
}

/// Concurrent clients each issuing sequential requests
#[derive(Debug, Clone, Serialize)]
pub struct ConcurrencyRun {
    pub protocol: Protocol,
    pub limit: u32,
    pub clients: u32,
    pub requests_per_client: u32,
    pub samples: Vec<Sample>,
    pub failures: u64,
    pub elapsed: Duration,
    pub requests_per_second: f64,
    pub summary: Option<LatencySummary>,
}

impl ConcurrencyRun {
    pub fn new(
        protocol: Protocol,
        limit: u32,
        clients: u32,
        requests_per_client: u32,
        samples: Vec<Sample>,
        failures: u64,
        elapsed: Duration,
    ) -> Self {
        let summary = LatencySummary::from_samples(&samples);
        let requests_per_second = stats::throughput_rate(samples.len() as u64, elapsed);
        Self {
            protocol,
            limit,
            clients,
            requests_per_client,
            samples,
            failures,
            elapsed,
            requests_per_second,
            summary,
        }
    }

    pub fn successes(&self) -> u64 {
        self.samples.len() as u64
    }
}

/// Latency runs repeated across `limit` values
#[derive(Debug, Clone, Serialize)]
pub struct PayloadSweep {
    pub protocol: Protocol,
    pub requests: u32,
    pub points: Vec<LatencyRun>,
}

impl PayloadSweep {
    /// `(limit, mean latency)` for every size that produced samples
    pub fn means(&self) -> Vec<(u32, f64)> {
        self.points
            .iter()
            .filter_map(|run| run.mean_ms().map(|mean| (run.limit, mean)))
            .collect()
    }
}

/// Result of one [`RunConfig`](crate::models::RunConfig)
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunOutcome {
    Latency(LatencyRun),
    Throughput(ThroughputRun),
    Concurrency(ConcurrencyRun),
}

impl RunOutcome {
    pub fn protocol(&self) -> Protocol {
        match self {
            RunOutcome::Latency(run) => run.protocol,
            RunOutcome::Throughput(run) => run.protocol,
            RunOutcome::Concurrency(run) => run.protocol,
        }
    }

    pub fn successes(&self) -> u64 {
        match self {
            RunOutcome::Latency(run) => run.samples.len() as u64,
            RunOutcome::Throughput(run) => run.successes,
            RunOutcome::Concurrency(run) => run.successes(),
        }
    }

    pub fn failures(&self) -> u64 {
        match self {
            RunOutcome::Latency(run) => run.failures as u64,
            RunOutcome::Throughput(run) => run.failures,
            RunOutcome::Concurrency(run) => run.failures,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            RunOutcome::Latency(run) => run.elapsed,
            RunOutcome::Throughput(run) => run.elapsed,
            RunOutcome::Concurrency(run) => run.elapsed,
        }
    }
}
