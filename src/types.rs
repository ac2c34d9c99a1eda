//! Type definitions and aliases

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Arena backends, one per wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// JSON over `GET /logs`
    #[value(name = "rest")]
    Rest,
    /// `POST /graphql`
    #[value(name = "graphql")]
    GraphQL,
    /// Unary calls on `activity.ActivityService`
    #[value(name = "grpc")]
    Grpc,
    /// Server-Sent Events stream
    #[value(name = "sse")]
    Sse,
    /// WebSocket stream
    #[value(name = "websocket", alias = "ws")]
    WebSocket,
}

/// How a protocol is reached on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
}

impl Protocol {
    /// Every arena protocol in display order
    pub const ALL: [Protocol; 5] = [
        Protocol::Rest,
        Protocol::GraphQL,
        Protocol::Grpc,
        Protocol::Sse,
        Protocol::WebSocket,
    ];

    /// Human-readable protocol name
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Rest => "REST",
            Protocol::GraphQL => "GraphQL",
            Protocol::Grpc => "gRPC",
            Protocol::Sse => "SSE",
            Protocol::WebSocket => "WebSocket",
        }
    }

    /// Upper-case key used in environment variable names
    pub fn env_key(&self) -> &'static str {
        match self {
            Protocol::Rest => "REST",
            Protocol::GraphQL => "GRAPHQL",
            Protocol::Grpc => "GRPC",
            Protocol::Sse => "SSE",
            Protocol::WebSocket => "WEBSOCKET",
        }
    }

    pub fn default_port(&self) -> u16 {
        use crate::defaults::*;
        match self {
            Protocol::Rest => DEFAULT_REST_PORT,
            Protocol::GraphQL => DEFAULT_GRAPHQL_PORT,
            Protocol::Sse => DEFAULT_SSE_PORT,
            Protocol::WebSocket => DEFAULT_WEBSOCKET_PORT,
            Protocol::Grpc => DEFAULT_GRPC_PORT,
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Protocol::Grpc => Transport::Grpc,
            _ => Transport::Http,
        }
    }

    /// Whether the protocol exposes a request/response log fetch.
    ///
    /// Streaming transports only answer health probes.
    pub fn is_benchmarkable(&self) -> bool {
        matches!(self, Protocol::Rest | Protocol::GraphQL | Protocol::Grpc)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rest" => Ok(Protocol::Rest),
            "graphql" | "gql" => Ok(Protocol::GraphQL),
            "grpc" => Ok(Protocol::Grpc),
            "sse" => Ok(Protocol::Sse),
            "websocket" | "ws" => Ok(Protocol::WebSocket),
            other => Err(AppError::parse(format!("Unknown protocol: {}", other))),
        }
    }
}

/// Whether an adapter opens a new connection per call or reuses one handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// New client/channel for every request; elapsed time includes connect
    #[default]
    Fresh,
    /// One client/channel reused across requests
    Shared,
}

impl FromStr for ConnectionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fresh" => Ok(ConnectionMode::Fresh),
            "shared" => Ok(ConnectionMode::Shared),
            other => Err(AppError::parse(format!("Unknown connection mode: {}", other))),
        }
    }
}

/// Benchmark categories selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkCategory {
    /// Health discovery only
    Health,
    /// Sequential requests, one sample per request
    Latency,
    /// Batches of concurrent requests over a fixed window
    Throughput,
    /// Concurrent clients issuing sequential requests
    Concurrency,
    /// Latency runs repeated for each payload size
    Payload,
    /// Every measuring category
    All,
}

impl BenchmarkCategory {
    /// Concrete measuring categories this selection runs
    pub fn expand(&self) -> Vec<BenchmarkCategory> {
        match self {
            BenchmarkCategory::Health => Vec::new(),
            BenchmarkCategory::All => vec![
                BenchmarkCategory::Latency,
                BenchmarkCategory::Throughput,
                BenchmarkCategory::Concurrency,
                BenchmarkCategory::Payload,
            ],
            other => vec![*other],
        }
    }

    pub fn includes(&self, category: BenchmarkCategory) -> bool {
        self.expand().contains(&category)
    }
}

/// Latency classification used to colour report cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    /// Under 10ms
    Good,
    /// 10-50ms
    Moderate,
    /// Over 50ms
    Poor,
}

impl PerformanceLevel {
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_millis(duration.as_secs_f64() * 1000.0)
    }

    pub fn from_millis(ms: f64) -> Self {
        if ms < 10.0 {
            Self::Good
        } else if ms < 50.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }
}
