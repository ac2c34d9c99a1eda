//! Suite orchestration: health discovery, then every selected category
//! against every active protocol

use super::{BenchmarkEngine, ConcurrencyRun, HealthReport, LatencyRun, PayloadSweep, ThroughputRun};
use crate::{
    client::{AdapterFactory, AdapterRegistry, ProtocolAdapter},
    error::{AppError, Result},
    logging::BenchmarkLogger,
    models::Config,
    stats::{rank_protocols, LatencySummary, ProtocolRanking},
    types::{BenchmarkCategory, ConnectionMode, Protocol},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Protocol every speed-up is expressed against
pub const BASELINE_PROTOCOL: Protocol = Protocol::Rest;

/// A run that was not executed because its backend went down
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRun {
    pub protocol: Protocol,
    pub category: BenchmarkCategory,
    pub reason: String,
}

/// Everything one suite invocation measured
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub category: BenchmarkCategory,
    pub health: HealthReport,
    pub latency: Vec<LatencyRun>,
    pub throughput: Vec<ThroughputRun>,
    pub concurrency: Vec<ConcurrencyRun>,
    pub payload: Vec<PayloadSweep>,
    pub skipped: Vec<SkippedRun>,
}

impl SuiteReport {
    pub fn new(category: BenchmarkCategory, health: HealthReport) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            category,
            health,
            latency: Vec::new(),
            throughput: Vec::new(),
            concurrency: Vec::new(),
            payload: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Active protocols that support log fetches
    pub fn benchmark_targets(&self) -> Vec<Protocol> {
        self.health.active().into_iter().filter(Protocol::is_benchmarkable).collect()
    }

    pub fn has_measurements(&self) -> bool {
        !(self.latency.is_empty() && self.throughput.is_empty() && self.concurrency.is_empty() && self.payload.is_empty())
    }

    /// Mean-latency ranking, from latency runs or else concurrency runs
    pub fn rankings(&self) -> Vec<ProtocolRanking> {
        let mut summaries: Vec<(Protocol, LatencySummary)> = self
            .latency
            .iter()
            .filter_map(|run| run.summary.clone().map(|s| (run.protocol, s)))
            .collect();
        if summaries.is_empty() {
            summaries = self
                .concurrency
                .iter()
                .filter_map(|run| run.summary.clone().map(|s| (run.protocol, s)))
                .collect();
        }
        rank_protocols(&summaries, BASELINE_PROTOCOL)
    }

    /// Fails when nothing could be benchmarked
    pub fn ensure_active(&self) -> Result<()> {
        if self.health.active_count() == 0 {
            return Err(AppError::health_check("0 active protocols: no backend passed its health check"));
        }
        if !self.category.expand().is_empty() && self.benchmark_targets().is_empty() {
            return Err(AppError::health_check(
                "no active protocol supports log fetches (only streaming backends are up)",
            ));
        }
        Ok(())
    }
}

/// Runs the configured categories with one registry per connection mode
pub struct BenchmarkSuite {
    config: Config,
    engine: BenchmarkEngine,
    /// Adapters in the configured connection mode
    registry: AdapterRegistry,
    /// Adapters reusing one client, for throughput runs
    shared: AdapterRegistry,
}

impl BenchmarkSuite {
    pub fn from_config(config: Config, logger: BenchmarkLogger) -> Result<Self> {
        let endpoints = config.endpoints();
        let registry = AdapterFactory::new(config.connection_mode).create_registry(&endpoints)?;
        let shared = AdapterFactory::new(ConnectionMode::Shared).create_registry(&endpoints)?;
        Ok(Self::with_registries(config, BenchmarkEngine::new(logger), registry, shared))
    }

    pub fn with_registries(config: Config, engine: BenchmarkEngine, registry: AdapterRegistry, shared: AdapterRegistry) -> Self {
        Self { config, engine, registry, shared }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self) -> Result<SuiteReport> {
        let adapters = self
            .config
            .protocols
            .iter()
            .map(|&protocol| self.registry.get(protocol))
            .collect::<Result<Vec<Arc<dyn ProtocolAdapter>>>>()?;

        let health = self.engine.discover_active(&adapters).await;
        let mut report = SuiteReport::new(self.config.category, health);
        let targets = report.benchmark_targets();

        for category in self.config.category.expand() {
            for &protocol in &targets {
                let outcome = self.run_category(category, protocol, &mut report).await;
                match outcome {
                    Ok(()) => {}
                    Err(error @ AppError::HealthCheck(_)) => {
                        self.engine.logger.run_skipped(protocol, category, &error).await;
                        report.skipped.push(SkippedRun { protocol, category, reason: error.to_string() });
                    }
                    Err(error) => return Err(error),
                }
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn run_category(&self, category: BenchmarkCategory, protocol: Protocol, report: &mut SuiteReport) -> Result<()> {
        let config = &self.config;
        match category {
            BenchmarkCategory::Latency => {
                let adapter = self.registry.get(protocol)?;
                let run = self.engine.run_latency(adapter.as_ref(), config.iterations, config.limit).await?;
                report.latency.push(run);
            }
            BenchmarkCategory::Throughput => {
                let adapter = self.shared.get(protocol)?;
                let run = self
                    .engine
                    .run_throughput(adapter.as_ref(), config.throughput_window(), config.batch_size, config.limit)
                    .await?;
                report.throughput.push(run);
            }
            BenchmarkCategory::Concurrency => {
                let adapter = self.registry.get(protocol)?;
                let run = self
                    .engine
                    .run_concurrency(adapter.as_ref(), config.clients, config.requests_per_client, config.concurrency_limit)
                    .await?;
                report.concurrency.push(run);
            }
            BenchmarkCategory::Payload => {
                let adapter = self.registry.get(protocol)?;
                let sweep = self
                    .engine
                    .run_payload_sweep(adapter.as_ref(), &config.payload_sizes, config.payload_iterations)
                    .await?;
                report.payload.push(sweep);
            }
            BenchmarkCategory::Health | BenchmarkCategory::All => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::StubAdapter;
    use super::*;

    fn registry(adapters: Vec<StubAdapter>) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        for adapter in adapters {
            registry.register(Arc::new(adapter));
        }
        registry
    }

    fn quick_config(category: BenchmarkCategory, protocols: Vec<Protocol>) -> Config {
        let mut config = Config::default();
        config.category = category;
        config.protocols = protocols;
        config.iterations = 3;
        config.payload_iterations = 2;
        config.payload_sizes = vec![1, 10];
        config.duration_seconds = 1;
        config.batch_size = 2;
        config.clients = 2;
        config.requests_per_client = 2;
        config
    }

    fn suite(config: Config, stubs: fn() -> Vec<StubAdapter>) -> BenchmarkSuite {
        let shared = registry(stubs().into_iter().map(StubAdapter::shared).collect());
        BenchmarkSuite::with_registries(config, BenchmarkEngine::default(), registry(stubs()), shared)
    }

    #[tokio::test]
    async fn test_health_only_suite() {
        let config = quick_config(BenchmarkCategory::Health, vec![Protocol::Rest, Protocol::Sse]);
        let suite = suite(config, || {
            vec![StubAdapter::new(Protocol::Rest, 0), StubAdapter::new(Protocol::Sse, 0).down()]
        });
        let report = suite.run().await.unwrap();

        assert_eq!(report.health.active(), vec![Protocol::Rest]);
        assert!(!report.has_measurements());
        assert!(report.ensure_active().is_ok());
    }

    #[tokio::test]
    async fn test_down_protocols_are_excluded() {
        let config = quick_config(BenchmarkCategory::Latency, vec![Protocol::Rest, Protocol::Grpc]);
        let suite = suite(config, || {
            vec![StubAdapter::new(Protocol::Rest, 1), StubAdapter::new(Protocol::Grpc, 1).down()]
        });
        let report = suite.run().await.unwrap();

        assert_eq!(report.latency.len(), 1);
        assert_eq!(report.latency[0].protocol, Protocol::Rest);
    }

    #[tokio::test]
    async fn test_zero_active_protocols() {
        let config = quick_config(BenchmarkCategory::All, vec![Protocol::Rest]);
        let suite = suite(config, || vec![StubAdapter::new(Protocol::Rest, 0).down()]);
        let report = suite.run().await.unwrap();

        assert_eq!(report.health.active_count(), 0);
        assert!(!report.has_measurements());
        let error = report.ensure_active().unwrap_err();
        assert!(matches!(error, AppError::HealthCheck(_)));
        assert!(error.to_string().contains("0 active protocols"));
    }

    #[tokio::test]
    async fn test_streaming_only_is_not_benchmarkable() {
        let config = quick_config(BenchmarkCategory::Latency, vec![Protocol::WebSocket]);
        let suite = suite(config, || vec![StubAdapter::new(Protocol::WebSocket, 0)]);
        let report = suite.run().await.unwrap();

        assert!(report.latency.is_empty());
        assert!(report.ensure_active().is_err());
    }

    #[tokio::test]
    async fn test_all_categories_with_rankings() {
        let config = quick_config(BenchmarkCategory::All, vec![Protocol::Rest, Protocol::Grpc]);
        let suite = suite(config, || {
            vec![StubAdapter::new(Protocol::Rest, 6), StubAdapter::new(Protocol::Grpc, 2)]
        });
        let report = suite.run().await.unwrap();

        assert_eq!(report.latency.len(), 2);
        assert_eq!(report.throughput.len(), 2);
        assert_eq!(report.concurrency.len(), 2);
        assert_eq!(report.payload.len(), 2);
        assert!(report.skipped.is_empty());

        let rankings = report.rankings();
        assert_eq!(rankings[0].protocol, Protocol::Grpc);
        assert!(rankings[0].speedup_vs_baseline.unwrap() > 1.0);
    }

    #[tokio::test]
    async fn test_missing_adapter_is_config_error() {
        let config = quick_config(BenchmarkCategory::Latency, vec![Protocol::GraphQL]);
        let suite = suite(config, || vec![StubAdapter::new(Protocol::Rest, 0)]);
        assert!(matches!(suite.run().await, Err(AppError::Config(_))));
    }
}
