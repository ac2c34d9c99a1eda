//! Summary statistics over completed sample sets
//!
//! Everything here is pure aggregation: inputs are never mutated and the
//! same sample set always produces the same summary.

use crate::{models::Sample, types::Protocol};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// Percentiles reported for every latency summary
pub const REPORTED_PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];

/// Aggregate view of one run's successful latencies (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Population standard deviation
    pub std_dev_ms: f64,
}

impl LatencySummary {
    /// Summarize a set of latencies. `None` for an empty set.
    pub fn from_latencies(latencies: &[f64]) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mean_ms = mean(&sorted)?;
        Some(Self {
            count: sorted.len(),
            mean_ms,
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            p50_ms: percentile_nearest_rank(&sorted, 50.0)?,
            p95_ms: percentile_nearest_rank(&sorted, 95.0)?,
            p99_ms: percentile_nearest_rank(&sorted, 99.0)?,
            std_dev_ms: population_std_dev(&sorted, mean_ms),
        })
    }

    /// Summarize the successful samples of a run
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.is_success())
            .map(|s| s.elapsed_ms())
            .collect();
        Self::from_latencies(&latencies)
    }
}

/// Nearest-rank percentile over an ascending slice.
///
/// rank = ceil(p / 100 * n), clamped to `1..=n`, read at 1-based `rank`.
pub fn percentile_nearest_rank(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let rank = ((percentile / 100.0) * n as f64).ceil() as usize;
    let rank = rank.clamp(1, n);
    Some(sorted[rank - 1])
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Successful requests per second over a measured interval
pub fn throughput_rate(successes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        successes as f64 / secs
    }
}

/// How many times faster `candidate_ms` is than `baseline_ms`
pub fn speedup(baseline_ms: f64, candidate_ms: f64) -> Option<f64> {
    if candidate_ms > 0.0 && baseline_ms > 0.0 {
        Some(baseline_ms / candidate_ms)
    } else {
        None
    }
}

/// Position of one protocol in a latency comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRanking {
    pub protocol: Protocol,
    /// 1 = fastest
    pub rank: usize,
    pub mean_ms: f64,
    /// Baseline mean divided by this protocol's mean
    pub speedup_vs_baseline: Option<f64>,
}

/// Rank protocols by mean latency and compute speed-ups against `baseline`.
///
/// Speed-ups are only present when the baseline itself was measured.
pub fn rank_protocols(summaries: &[(Protocol, LatencySummary)], baseline: Protocol) -> Vec<ProtocolRanking> {
    let baseline_mean = summaries
        .iter()
        .find(|(protocol, _)| *protocol == baseline)
        .map(|(_, summary)| summary.mean_ms);

    let mut ordered: Vec<&(Protocol, LatencySummary)> = summaries.iter().collect();
    ordered.sort_by(|a, b| {
        a.1.mean_ms
            .partial_cmp(&b.1.mean_ms)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, (protocol, summary))| ProtocolRanking {
            protocol: *protocol,
            rank: index + 1,
            mean_ms: summary.mean_ms,
            speedup_vs_baseline: baseline_mean.and_then(|base| speedup(base, summary.mean_ms)),
        })
        .collect()
}
