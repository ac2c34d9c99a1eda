//! Configuration data model and validation

use crate::client::Endpoint;
use crate::types::{AppError, BenchmarkCategory, ConnectionMode, Protocol, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host every backend listens on
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_rest_port")]
    pub rest_port: u16,

    #[serde(default = "default_graphql_port")]
    pub graphql_port: u16,

    #[serde(default = "default_sse_port")]
    pub sse_port: u16,

    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,

    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,

    /// Protocols to probe and benchmark
    #[serde(default = "default_protocols")]
    pub protocols: Vec<Protocol>,

    /// Categories to run
    #[serde(default = "default_category")]
    pub category: BenchmarkCategory,

    /// Sequential requests per latency run
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// `limit` parameter for latency and throughput runs
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// `limit` values swept by payload runs
    #[serde(default = "default_payload_sizes")]
    pub payload_sizes: Vec<u32>,

    /// Requests per payload size
    #[serde(default = "default_iterations")]
    pub payload_iterations: u32,

    /// Throughput window
    #[serde(default = "default_duration_secs")]
    pub duration_seconds: u64,

    /// Concurrent requests per throughput batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Logical clients in concurrency runs
    #[serde(default = "default_clients")]
    pub clients: u32,

    #[serde(default = "default_requests_per_client")]
    pub requests_per_client: u32,

    /// `limit` parameter for concurrency runs
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: u32,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Connection mode for latency, payload and concurrency runs
    #[serde(default)]
    pub connection_mode: ConnectionMode,

    /// Commands that start each backend when `--spawn` is given
    #[serde(default)]
    pub server_commands: BTreeMap<Protocol, String>,

    /// Start configured backends before the suite
    #[serde(default)]
    pub spawn_servers: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Emit the report as JSON
    #[serde(default)]
    pub json_output: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            rest_port: default_rest_port(),
            graphql_port: default_graphql_port(),
            sse_port: default_sse_port(),
            websocket_port: default_websocket_port(),
            grpc_port: default_grpc_port(),
            protocols: default_protocols(),
            category: default_category(),
            iterations: default_iterations(),
            limit: default_limit(),
            payload_sizes: default_payload_sizes(),
            payload_iterations: default_iterations(),
            duration_seconds: default_duration_secs(),
            batch_size: default_batch_size(),
            clients: default_clients(),
            requests_per_client: default_requests_per_client(),
            concurrency_limit: default_concurrency_limit(),
            timeout_seconds: default_timeout_secs(),
            connection_mode: ConnectionMode::default(),
            server_commands: BTreeMap::new(),
            spawn_servers: false,
            enable_color: default_enable_color(),
            json_output: false,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the throughput window as Duration
    pub fn throughput_window(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    pub fn port_for(&self, protocol: Protocol) -> u16 {
        match protocol {
            Protocol::Rest => self.rest_port,
            Protocol::GraphQL => self.graphql_port,
            Protocol::Sse => self.sse_port,
            Protocol::WebSocket => self.websocket_port,
            Protocol::Grpc => self.grpc_port,
        }
    }

    pub fn set_port(&mut self, protocol: Protocol, port: u16) {
        match protocol {
            Protocol::Rest => self.rest_port = port,
            Protocol::GraphQL => self.graphql_port = port,
            Protocol::Sse => self.sse_port = port,
            Protocol::WebSocket => self.websocket_port = port,
            Protocol::Grpc => self.grpc_port = port,
        }
    }

    /// Endpoint for one protocol, carrying the configured timeout
    pub fn endpoint(&self, protocol: Protocol) -> Endpoint {
        Endpoint::new(protocol, self.host.clone(), self.port_for(protocol)).with_timeout(self.timeout())
    }

    /// Endpoints for every selected protocol, in selection order
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.protocols.iter().map(|&protocol| self.endpoint(protocol)).collect()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::config("Host cannot be empty"));
        }

        if self.protocols.is_empty() {
            return Err(AppError::config("At least one protocol must be selected"));
        }

        for protocol in Protocol::ALL {
            if self.port_for(protocol) == 0 {
                return Err(AppError::config(format!("{} port must be greater than 0", protocol)));
            }
        }

        check_range("Iterations", self.iterations, 1, 10_000)?;
        check_range("Payload iterations", self.payload_iterations, 1, 10_000)?;
        check_range("Limit", self.limit, 1, 100_000)?;
        check_range("Concurrency limit", self.concurrency_limit, 1, 100_000)?;
        check_range("Batch size", self.batch_size, 1, 1_000)?;
        check_range("Clients", self.clients, 1, 1_000)?;
        check_range("Requests per client", self.requests_per_client, 1, 10_000)?;

        if self.payload_sizes.is_empty() {
            return Err(AppError::config("At least one payload size is required"));
        }
        for &size in &self.payload_sizes {
            check_range("Payload size", size, 1, 100_000)?;
        }

        if self.duration_seconds == 0 {
            return Err(AppError::config("Throughput duration must be greater than 0"));
        }
        if self.duration_seconds > 300 {
            return Err(AppError::config("Throughput duration cannot exceed 300 seconds"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }
        if self.timeout_seconds > 60 {
            return Err(AppError::config("Timeout cannot exceed 60 seconds"));
        }

        if self.spawn_servers && self.server_commands.is_empty() {
            return Err(AppError::config(
                "--spawn given but no ARENA_<PROTOCOL>_CMD server commands are configured",
            ));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("ARENA_HOST") {
            self.host = host.trim().to_string();
        }

        if let Ok(protocols) = std::env::var("ARENA_PROTOCOLS") {
            self.protocols = parse_protocol_list(&protocols)
                .map_err(|e| AppError::config(format!("Invalid ARENA_PROTOCOLS value '{}': {}", protocols, e)))?;
        }

        for protocol in Protocol::ALL {
            let port_var = format!("ARENA_{}_PORT", protocol.env_key());
            if let Ok(port) = std::env::var(&port_var) {
                let port = port.trim().parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", port_var, port, e)))?;
                self.set_port(protocol, port);
            }

            let cmd_var = format!("ARENA_{}_CMD", protocol.env_key());
            if let Ok(command) = std::env::var(&cmd_var) {
                if !command.trim().is_empty() {
                    self.server_commands.insert(protocol, command.trim().to_string());
                }
            }
        }

        if let Ok(iterations) = std::env::var("ARENA_ITERATIONS") {
            self.iterations = iterations.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_ITERATIONS value '{}': {}", iterations, e)))?;
            self.payload_iterations = self.iterations;
        }

        if let Ok(limit) = std::env::var("ARENA_LIMIT") {
            self.limit = limit.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_LIMIT value '{}': {}", limit, e)))?;
        }

        if let Ok(sizes) = std::env::var("ARENA_PAYLOAD_SIZES") {
            self.payload_sizes = parse_u32_list(&sizes)
                .map_err(|e| AppError::config(format!("Invalid ARENA_PAYLOAD_SIZES value '{}': {}", sizes, e)))?;
        }

        if let Ok(duration) = std::env::var("ARENA_DURATION_SECONDS") {
            self.duration_seconds = duration.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_DURATION_SECONDS value '{}': {}", duration, e)))?;
        }

        if let Ok(batch_size) = std::env::var("ARENA_BATCH_SIZE") {
            self.batch_size = batch_size.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_BATCH_SIZE value '{}': {}", batch_size, e)))?;
        }

        if let Ok(clients) = std::env::var("ARENA_CLIENTS") {
            self.clients = clients.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_CLIENTS value '{}': {}", clients, e)))?;
        }

        if let Ok(requests) = std::env::var("ARENA_REQUESTS_PER_CLIENT") {
            self.requests_per_client = requests.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_REQUESTS_PER_CLIENT value '{}': {}", requests, e)))?;
        }

        if let Ok(timeout) = std::env::var("ARENA_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ARENA_ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ARENA_ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min {
        return Err(AppError::config(format!("{} must be at least {}", name, min)));
    }
    if value > max {
        return Err(AppError::config(format!("{} cannot exceed {}", name, max)));
    }
    Ok(())
}

/// Parse a comma-separated protocol list, dropping duplicates
pub fn parse_protocol_list(value: &str) -> Result<Vec<Protocol>> {
    let mut protocols = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let protocol: Protocol = item.parse()?;
        if !protocols.contains(&protocol) {
            protocols.push(protocol);
        }
    }
    if protocols.is_empty() {
        return Err(AppError::parse("protocol list is empty"));
    }
    Ok(protocols)
}

/// Parse a comma-separated list of positive integers
pub fn parse_u32_list(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(AppError::from))
        .collect()
}

// Default value functions for serde
fn default_host() -> String {
    crate::defaults::DEFAULT_HOST.to_string()
}

fn default_rest_port() -> u16 {
    crate::defaults::DEFAULT_REST_PORT
}

fn default_graphql_port() -> u16 {
    crate::defaults::DEFAULT_GRAPHQL_PORT
}

fn default_sse_port() -> u16 {
    crate::defaults::DEFAULT_SSE_PORT
}

fn default_websocket_port() -> u16 {
    crate::defaults::DEFAULT_WEBSOCKET_PORT
}

fn default_grpc_port() -> u16 {
    crate::defaults::DEFAULT_GRPC_PORT
}

fn default_protocols() -> Vec<Protocol> {
    Protocol::ALL.to_vec()
}

fn default_category() -> BenchmarkCategory {
    BenchmarkCategory::All
}

fn default_iterations() -> u32 {
    crate::defaults::DEFAULT_ITERATIONS
}

fn default_limit() -> u32 {
    crate::defaults::DEFAULT_LIMIT
}

fn default_payload_sizes() -> Vec<u32> {
    crate::defaults::DEFAULT_PAYLOAD_SIZES.to_vec()
}

fn default_duration_secs() -> u64 {
    crate::defaults::DEFAULT_THROUGHPUT_DURATION.as_secs()
}

fn default_batch_size() -> u32 {
    crate::defaults::DEFAULT_BATCH_SIZE
}

fn default_clients() -> u32 {
    crate::defaults::DEFAULT_CLIENTS
}

fn default_requests_per_client() -> u32 {
    crate::defaults::DEFAULT_REQUESTS_PER_CLIENT
}

fn default_concurrency_limit() -> u32 {
    crate::defaults::DEFAULT_CONCURRENCY_LIMIT
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
