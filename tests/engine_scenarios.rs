//! Engine scenarios against mock backends with controlled latency

use async_trait::async_trait;
use protocol_arena::{
    client::{probe_health, RestAdapter},
    executor::RunOutcome,
    AppError, BenchmarkEngine, ConnectionMode, Endpoint, Protocol, ProtocolAdapter, Result, RunConfig,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const BACKEND_DELAY: Duration = Duration::from_millis(5);

/// Upper bound on scheduling jitter added to the fixed delay
const JITTER_MS: f64 = 45.0;

async fn mock_rest_backend(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1, "user_id": 3, "action": "view", "timestamp": "2024-01-01T00:00:00" }]))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

fn rest_adapter(server: &MockServer, mode: ConnectionMode) -> RestAdapter {
    let endpoint = Endpoint::new(Protocol::Rest, "127.0.0.1", server.address().port())
        .with_timeout(Duration::from_secs(1));
    RestAdapter::new(endpoint, mode).unwrap()
}

/// Adapter that always answers after a fixed sleep
struct FixedLatencyAdapter {
    endpoint: Endpoint,
    latency: Duration,
}

impl FixedLatencyAdapter {
    fn new(latency: Duration) -> Self {
        Self {
            endpoint: Endpoint::new(Protocol::Grpc, "fixed", 0).with_timeout(Duration::from_secs(1)),
            latency,
        }
    }
}

#[async_trait]
impl ProtocolAdapter for FixedLatencyAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn fetch_logs(&self, limit: u32) -> Result<usize> {
        tokio::time::sleep(self.latency).await;
        Ok(limit as usize)
    }

    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_latency_mean_tracks_backend_delay() {
    let server = mock_rest_backend(BACKEND_DELAY).await;
    let adapter = rest_adapter(&server, ConnectionMode::Shared);

    let run = BenchmarkEngine::default().run_latency(&adapter, 20, 1).await.unwrap();
    let summary = run.summary.clone().unwrap();

    assert_eq!(run.samples.len(), 20);
    assert_eq!(run.failures, 0);
    assert!(summary.mean_ms >= 5.0, "mean {}ms below the backend delay", summary.mean_ms);
    assert!(summary.mean_ms < 5.0 + JITTER_MS, "mean {}ms", summary.mean_ms);
    assert!(summary.min_ms <= summary.p95_ms && summary.p95_ms <= summary.max_ms);
}

#[tokio::test]
async fn test_ten_clients_by_ten_requests() {
    let server = mock_rest_backend(BACKEND_DELAY).await;
    let adapter = rest_adapter(&server, ConnectionMode::Shared);

    let run = BenchmarkEngine::default().run_concurrency(&adapter, 10, 10, 1).await.unwrap();

    assert_eq!(run.successes(), 100);
    assert_eq!(run.failures, 0);
    let expected_rate = 100.0 / run.elapsed.as_secs_f64();
    assert!((run.requests_per_second - expected_rate).abs() < 1e-6);

    // Ten logically parallel clients finish well before 100 sequential requests would
    assert!(run.elapsed < Duration::from_millis(100 * 5));
    assert!(run.summary.unwrap().mean_ms >= 5.0);
}

#[tokio::test]
async fn test_throughput_window_is_bounded() {
    let server = mock_rest_backend(BACKEND_DELAY).await;
    let adapter = rest_adapter(&server, ConnectionMode::Shared);
    let window = Duration::from_millis(500);

    let run = BenchmarkEngine::default().run_throughput(&adapter, window, 5, 1).await.unwrap();

    assert!(run.successes > 0);
    assert_eq!(run.failures, 0);
    assert_eq!(run.successes, u64::from(run.batches) * 5);
    // No batch starts after the window; the last one is capped by the request timeout
    assert!(run.elapsed >= window);
    assert!(run.elapsed < window + adapter_timeout() + Duration::from_millis(250));
    let expected_rate = run.successes as f64 / run.elapsed.as_secs_f64();
    assert!((run.requests_per_second - expected_rate).abs() < 1e-6);
}

fn adapter_timeout() -> Duration {
    Duration::from_secs(1)
}

#[tokio::test]
async fn test_down_backend_is_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = Endpoint::new(Protocol::Rest, "127.0.0.1", port).with_timeout(Duration::from_millis(300));
    let adapter: Arc<dyn ProtocolAdapter> = Arc::new(RestAdapter::new(endpoint.clone(), ConnectionMode::Fresh).unwrap());
    let engine = BenchmarkEngine::default();

    let health = engine.discover_active(&[adapter.clone()]).await;
    assert_eq!(health.active_count(), 0);
    assert!(!probe_health(adapter.as_ref()).await.healthy);

    let result = engine.run(adapter.as_ref(), &RunConfig::latency(&endpoint, 5, 1)).await;
    assert!(matches!(result, Err(AppError::HealthCheck(_))));
}

#[tokio::test]
async fn test_unhealthy_status_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "starting" })))
        .mount(&server)
        .await;
    let adapter = rest_adapter(&server, ConnectionMode::Fresh);

    let result = BenchmarkEngine::default().run_latency(&adapter, 3, 1).await;
    assert!(matches!(result, Err(AppError::HealthCheck(_))));
}

#[tokio::test]
async fn test_fixed_latency_runs_are_repeatable() {
    let adapter = FixedLatencyAdapter::new(Duration::from_millis(3));
    let engine = BenchmarkEngine::default();

    let first = engine.run_latency(&adapter, 10, 1).await.unwrap();
    let second = engine.run_latency(&adapter, 10, 1).await.unwrap();

    assert_eq!(first.samples.len(), second.samples.len());
    let (a, b) = (first.mean_ms().unwrap(), second.mean_ms().unwrap());
    assert!((a - b).abs() < JITTER_MS, "{} vs {}", a, b);
}

#[tokio::test]
async fn test_generic_run_dispatches_workload() {
    let adapter = FixedLatencyAdapter::new(Duration::from_millis(1));
    let run = RunConfig::concurrency(adapter.endpoint(), 3, 2, 5);

    let outcome = BenchmarkEngine::default().run(&adapter, &run).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Concurrency(_)));
    assert_eq!(outcome.protocol(), Protocol::Grpc);
    assert_eq!(outcome.successes(), 6);
    assert_eq!(outcome.failures(), 0);
}
