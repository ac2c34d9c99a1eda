//! Protocol adapters and per-request timing
//!
//! Every backend is reached through a [`ProtocolAdapter`]; the engine only
//! ever sees the trait. Adapters are looked up by [`Protocol`] in an
//! [`AdapterRegistry`].

pub mod graphql;
pub mod grpc;
pub mod http;
pub mod proto;
pub mod rest;
pub mod streaming;


use crate::{
    error::{AppError, Result},
    models::{FailureKind, Sample},
    types::{ConnectionMode, Protocol, Transport},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::timeout;

pub use graphql::GraphQlAdapter;
pub use grpc::GrpcAdapter;
pub use rest::RestAdapter;
pub use streaming::StreamingAdapter;

/// One backend's client, issuing log fetches and health probes
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Protocol this adapter speaks
    fn protocol(&self) -> Protocol;

    /// Where the adapter sends requests
    fn endpoint(&self) -> &Endpoint;

    /// Whether requests reuse one client handle
    fn connection_mode(&self) -> ConnectionMode {
        ConnectionMode::Fresh
    }

    /// Fetch `limit` log records, returning how many came back
    async fn fetch_logs(&self, limit: u32) -> Result<usize>;

    /// Succeeds only when the backend reports itself healthy
    async fn check_health(&self) -> Result<()>;
}

/// Address and per-request time budget of one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Absolute URL for a path on this endpoint
    pub fn url(&self, path: &str) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url())?;
        Ok(base.join(path)?)
    }
}

/// Outcome of one health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProbe {
    pub protocol: Protocol,
    pub port: u16,
    pub healthy: bool,
    pub response_time: Duration,
    pub error: Option<String>,
}

/// Issue one fetch under the endpoint's time budget.
///
/// Returns the elapsed time on success. Timeouts, transport failures and
/// bad responses all come back as errors; nothing panics.
pub async fn measure(adapter: &dyn ProtocolAdapter, limit: u32) -> Result<Duration> {
    let (elapsed, outcome) = timed_fetch(adapter, limit).await;
    outcome.map(|_| elapsed)
}

/// Issue one fetch and record it as a [`Sample`], successful or not
pub async fn sample(adapter: &dyn ProtocolAdapter, limit: u32) -> Sample {
    let (elapsed, outcome) = timed_fetch(adapter, limit).await;
    match outcome {
        Ok(_) => Sample::success(adapter.protocol(), elapsed),
        Err(error) => Sample::failure(adapter.protocol(), elapsed, FailureKind::from_error(&error)),
    }
}

async fn timed_fetch(adapter: &dyn ProtocolAdapter, limit: u32) -> (Duration, Result<usize>) {
    let budget = adapter.endpoint().timeout;
    let start = Instant::now();
    let outcome = match timeout(budget, adapter.fetch_logs(limit)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(format!(
            "{} request exceeded {}ms",
            adapter.protocol(),
            budget.as_millis()
        ))),
    };
    (start.elapsed(), outcome)
}

/// Probe a backend's health under the endpoint's time budget
pub async fn probe_health(adapter: &dyn ProtocolAdapter) -> HealthProbe {
    let endpoint = adapter.endpoint();
    let start = Instant::now();
    let outcome = match timeout(endpoint.timeout, adapter.check_health()).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(format!(
            "{} health check exceeded {}ms",
            adapter.protocol(),
            endpoint.timeout.as_millis()
        ))),
    };

    HealthProbe {
        protocol: adapter.protocol(),
        port: endpoint.port,
        healthy: outcome.is_ok(),
        response_time: start.elapsed(),
        error: outcome.err().map(|e| e.to_string()),
    }
}

/// Adapter lookup table keyed by protocol
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Protocol, Arc<dyn ProtocolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for its protocol
    pub fn register(&mut self, adapter: Arc<dyn ProtocolAdapter>) {
        self.adapters.insert(adapter.protocol(), adapter);
    }

    pub fn get(&self, protocol: Protocol) -> Result<Arc<dyn ProtocolAdapter>> {
        self.adapters
            .get(&protocol)
            .cloned()
            .ok_or_else(|| AppError::config(format!("No adapter registered for {}", protocol)))
    }

    pub fn contains(&self, protocol: Protocol) -> bool {
        self.adapters.contains_key(&protocol)
    }

    /// Registered protocols in display order
    pub fn protocols(&self) -> Vec<Protocol> {
        Protocol::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Builds the stock adapter for each protocol
pub struct AdapterFactory {
    mode: ConnectionMode,
}

impl AdapterFactory {
    pub fn new(mode: ConnectionMode) -> Self {
        Self { mode }
    }

    pub fn create(&self, endpoint: &Endpoint) -> Result<Arc<dyn ProtocolAdapter>> {
        let adapter: Arc<dyn ProtocolAdapter> = match (endpoint.protocol.transport(), endpoint.protocol) {
            (Transport::Grpc, _) => Arc::new(GrpcAdapter::new(endpoint.clone(), self.mode)?),
            (Transport::Http, Protocol::Rest) => Arc::new(RestAdapter::new(endpoint.clone(), self.mode)?),
            (Transport::Http, Protocol::GraphQL) => Arc::new(GraphQlAdapter::new(endpoint.clone(), self.mode)?),
            (Transport::Http, _) => Arc::new(StreamingAdapter::new(endpoint.clone())?),
        };
        Ok(adapter)
    }

    /// Registry holding one adapter per endpoint
    pub fn create_registry(&self, endpoints: &[Endpoint]) -> Result<AdapterRegistry> {
        let mut registry = AdapterRegistry::new();
        for endpoint in endpoints {
            registry.register(self.create(endpoint)?);
        }
        Ok(registry)
    }
}
