//! Benchmark execution engine
//!
//! All requests of a run are issued from the calling task. "Concurrent"
//! requests are futures joined with [`join_all`], never spawned tasks, so
//! the engine behaves the same on a current-thread runtime.

pub mod results;
pub mod suite;

pub use results::{ConcurrencyRun, LatencyRun, PayloadSweep, RunOutcome, ThroughputRun};
pub use suite::{BenchmarkSuite, SuiteReport};

use crate::{
    client::{self, HealthProbe, ProtocolAdapter},
    error::{AppError, Result},
    logging::BenchmarkLogger,
    models::{RunConfig, Sample, Workload},
    types::Protocol,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Health of every probed backend
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub checked_at: DateTime<Utc>,
    pub probes: Vec<HealthProbe>,
}

impl HealthReport {
    /// Healthy protocols in probe order
    pub fn active(&self) -> Vec<Protocol> {
        self.probes.iter().filter(|p| p.healthy).map(|p| p.protocol).collect()
    }

    pub fn active_count(&self) -> usize {
        self.probes.iter().filter(|p| p.healthy).count()
    }

    pub fn is_active(&self, protocol: Protocol) -> bool {
        self.probes.iter().any(|p| p.protocol == protocol && p.healthy)
    }
}

/// Runs latency, throughput and concurrency workloads against adapters
#[derive(Clone)]
pub struct BenchmarkEngine {
    logger: BenchmarkLogger,
}

impl Default for BenchmarkEngine {
    fn default() -> Self {
        Self::new(BenchmarkLogger::silent())
    }
}

impl BenchmarkEngine {
    pub fn new(logger: BenchmarkLogger) -> Self {
        Self { logger }
    }

    /// Probe every adapter concurrently
    pub async fn discover_active(&self, adapters: &[Arc<dyn ProtocolAdapter>]) -> HealthReport {
        let probes = join_all(adapters.iter().map(|adapter| client::probe_health(adapter.as_ref()))).await;
        for probe in &probes {
            self.logger.health_probe(probe).await;
        }
        HealthReport { checked_at: Utc::now(), probes }
    }

    /// Precondition for every run: the backend must report healthy
    pub async fn ensure_healthy(&self, adapter: &dyn ProtocolAdapter) -> Result<()> {
        let probe = client::probe_health(adapter).await;
        self.logger.health_probe(&probe).await;
        if probe.healthy {
            Ok(())
        } else {
            Err(AppError::health_check(format!(
                "{} on port {} is down: {}",
                probe.protocol,
                probe.port,
                probe.error.unwrap_or_else(|| "unhealthy".to_string())
            )))
        }
    }

    /// Execute one run after checking the backend's health
    pub async fn run(&self, adapter: &dyn ProtocolAdapter, run: &RunConfig) -> Result<RunOutcome> {
        run.validate()?;
        if run.protocol != adapter.protocol() {
            return Err(AppError::config(format!(
                "run targets {} but the adapter speaks {}",
                run.protocol,
                adapter.protocol()
            )));
        }
        if run.connection_mode != adapter.connection_mode() {
            return Err(AppError::config(format!(
                "run expects {:?} connections but the {} adapter uses {:?}",
                run.connection_mode,
                adapter.protocol(),
                adapter.connection_mode()
            )));
        }
        if !run.protocol.is_benchmarkable() {
            return Err(AppError::validation(format!("{} cannot be benchmarked", run.protocol)));
        }

        self.ensure_healthy(adapter).await?;

        let correlation_id = self.logger.run_started(run).await;
        let outcome = match run.workload {
            Workload::Latency { requests } => RunOutcome::Latency(
                self.latency(adapter, requests, run.limit, &correlation_id).await,
            ),
            Workload::Throughput { window, batch_size } => RunOutcome::Throughput(
                self.throughput(adapter, window, batch_size, run.limit, &correlation_id).await,
            ),
            Workload::Concurrency { clients, requests_per_client } => RunOutcome::Concurrency(
                self.concurrency(adapter, clients, requests_per_client, run.limit, &correlation_id).await,
            ),
        };
        self.logger
            .run_completed(&correlation_id, run, outcome.successes(), outcome.failures(), outcome.elapsed())
            .await;

        Ok(outcome)
    }

    pub async fn run_latency(&self, adapter: &dyn ProtocolAdapter, requests: u32, limit: u32) -> Result<LatencyRun> {
        let run = RunConfig::latency(adapter.endpoint(), requests, limit)
            .with_connection_mode(adapter.connection_mode());
        match self.run(adapter, &run).await? {
            RunOutcome::Latency(result) => Ok(result),
            other => Err(unexpected_outcome("latency", &other)),
        }
    }

    pub async fn run_throughput(
        &self,
        adapter: &dyn ProtocolAdapter,
        window: Duration,
        batch_size: u32,
        limit: u32,
    ) -> Result<ThroughputRun> {
        let run = RunConfig::throughput(adapter.endpoint(), window, batch_size, limit)
            .with_connection_mode(adapter.connection_mode());
        match self.run(adapter, &run).await? {
            RunOutcome::Throughput(result) => Ok(result),
            other => Err(unexpected_outcome("throughput", &other)),
        }
    }

    pub async fn run_concurrency(
        &self,
        adapter: &dyn ProtocolAdapter,
        clients: u32,
        requests_per_client: u32,
        limit: u32,
    ) -> Result<ConcurrencyRun> {
        let run = RunConfig::concurrency(adapter.endpoint(), clients, requests_per_client, limit)
            .with_connection_mode(adapter.connection_mode());
        match self.run(adapter, &run).await? {
            RunOutcome::Concurrency(result) => Ok(result),
            other => Err(unexpected_outcome("concurrency", &other)),
        }
    }

    /// One latency run per `limit` value
    pub async fn run_payload_sweep(&self, adapter: &dyn ProtocolAdapter, sizes: &[u32], requests: u32) -> Result<PayloadSweep> {
        let mut points = Vec::with_capacity(sizes.len());
        for &limit in sizes {
            points.push(self.run_latency(adapter, requests, limit).await?);
        }
        Ok(PayloadSweep { protocol: adapter.protocol(), requests, points })
    }

    async fn latency(&self, adapter: &dyn ProtocolAdapter, requests: u32, limit: u32, correlation_id: &str) -> LatencyRun {
        let start = Instant::now();
        let mut samples = Vec::with_capacity(requests as usize);
        let mut failures = 0;

        for _ in 0..requests {
            let sample = client::sample(adapter, limit).await;
            if sample.is_success() {
                samples.push(sample);
            } else {
                failures += 1;
                self.logger.sample_failed(correlation_id, &sample).await;
            }
        }

        LatencyRun::new(adapter.protocol(), limit, requests, samples, failures, start.elapsed())
    }

    async fn throughput(
        &self,
        adapter: &dyn ProtocolAdapter,
        window: Duration,
        batch_size: u32,
        limit: u32,
        correlation_id: &str,
    ) -> ThroughputRun {
        let start = Instant::now();
        let mut batches = 0;
        let mut successes = 0u64;
        let mut failures = 0u64;

        // A batch started before the deadline runs to completion
        while start.elapsed() < window {
            let batch = join_all((0..batch_size).map(|_| client::sample(adapter, limit))).await;
            batches += 1;
            for sample in &batch {
                if sample.is_success() {
                    successes += 1;
                } else {
                    failures += 1;
                    self.logger.sample_failed(correlation_id, sample).await;
                }
            }
        }

        ThroughputRun::new(
            adapter.protocol(),
            limit,
            window,
            batch_size,
            batches,
            successes,
            failures,
            start.elapsed(),
        )
    }

    async fn concurrency(
        &self,
        adapter: &dyn ProtocolAdapter,
        clients: u32,
        requests_per_client: u32,
        limit: u32,
        correlation_id: &str,
    ) -> ConcurrencyRun {
        let start = Instant::now();
        let per_client = join_all((0..clients).map(|_| async move {
            let mut samples: Vec<Sample> = Vec::with_capacity(requests_per_client as usize);
            for _ in 0..requests_per_client {
                samples.push(client::sample(adapter, limit).await);
            }
            samples
        }))
        .await;
        let elapsed = start.elapsed();

        let mut successes = Vec::new();
        let mut failures = 0u64;
        for sample in per_client.into_iter().flatten() {
            if sample.is_success() {
                successes.push(sample);
            } else {
                failures += 1;
                self.logger.sample_failed(correlation_id, &sample).await;
            }
        }

        ConcurrencyRun::new(adapter.protocol(), limit, clients, requests_per_client, successes, failures, elapsed)
    }
}

fn unexpected_outcome(expected: &str, outcome: &RunOutcome) -> AppError {
    AppError::internal(format!("expected a {} outcome for {}", expected, outcome.protocol()))
}
