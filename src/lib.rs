//! Protocol Arena benchmark client
//!
//! Measures request latency and throughput against the arena's log-serving
//! backends (REST, GraphQL, gRPC, SSE and WebSocket) and reports summary
//! statistics for each protocol.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod server;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, RunConfig, Sample, LogRecord};
pub use types::{Protocol, ConnectionMode, BenchmarkCategory};
pub use client::{ProtocolAdapter, AdapterRegistry, Endpoint};
pub use executor::{BenchmarkEngine, BenchmarkSuite, SuiteReport};
pub use stats::{LatencySummary, percentile_nearest_rank};
pub use output::{OutputCoordinator, OutputFormatter, OutputFormatterFactory};
pub use server::{ServerHandle, ServerManager, ServerSpec, ServerStart};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_REST_PORT: u16 = 8000;
    pub const DEFAULT_GRAPHQL_PORT: u16 = 8001;
    pub const DEFAULT_SSE_PORT: u16 = 8002;
    pub const DEFAULT_WEBSOCKET_PORT: u16 = 8003;
    pub const DEFAULT_GRPC_PORT: u16 = 50051;

    /// Sequential requests per latency run
    pub const DEFAULT_ITERATIONS: u32 = 50;
    /// `limit` parameter sent with every log fetch
    pub const DEFAULT_LIMIT: u32 = 1;
    pub const DEFAULT_PAYLOAD_SIZES: &[u32] = &[1, 100, 1000];
    pub const DEFAULT_THROUGHPUT_DURATION: Duration = Duration::from_secs(3);
    pub const DEFAULT_BATCH_SIZE: u32 = 20;
    pub const DEFAULT_CLIENTS: u32 = 10;
    pub const DEFAULT_REQUESTS_PER_CLIENT: u32 = 10;
    pub const DEFAULT_CONCURRENCY_LIMIT: u32 = 100;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}

/// One-line build description used by the debug banner
pub fn build_info() -> String {
    format!(
        "{} v{} ({} {}, built {})",
        PKG_NAME, VERSION, GIT_COMMIT, TARGET_TRIPLE, BUILD_TIME
    )
}
