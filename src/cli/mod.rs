//! Command-line interface

use crate::types::{BenchmarkCategory, ConnectionMode, Protocol};
use clap::{ArgAction, Parser};

/// Protocol Arena benchmark client - measures REST, GraphQL and gRPC log
/// fetches and probes SSE/WebSocket backends
#[derive(Parser, Debug, Clone)]
#[command(name = "arena-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Benchmark category to run
    #[arg(short, long, value_enum)]
    pub mode: Option<BenchmarkCategory>,

    /// Protocol to include (repeatable; default: all five)
    #[arg(short, long = "protocol", value_enum, action = ArgAction::Append)]
    pub protocols: Vec<Protocol>,

    /// Host every backend listens on
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub rest_port: Option<u16>,

    #[arg(long, value_name = "PORT")]
    pub graphql_port: Option<u16>,

    #[arg(long, value_name = "PORT")]
    pub sse_port: Option<u16>,

    #[arg(long, value_name = "PORT")]
    pub websocket_port: Option<u16>,

    #[arg(long, value_name = "PORT")]
    pub grpc_port: Option<u16>,

    /// Sequential requests per latency run (and per payload size)
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Records requested per log fetch
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Comma-separated `limit` values for payload runs
    #[arg(long, value_name = "SIZES")]
    pub payload_sizes: Option<String>,

    /// Throughput window in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<u64>,

    /// Concurrent requests per throughput batch
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Logical clients in concurrency runs
    #[arg(short, long)]
    pub clients: Option<u32>,

    /// Sequential requests issued by each concurrency client
    #[arg(long)]
    pub requests_per_client: Option<u32>,

    /// Records requested per fetch in concurrency runs
    #[arg(long)]
    pub concurrency_limit: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Connection handling for latency, payload and concurrency runs
    #[arg(long, value_enum)]
    pub connection: Option<ConnectionMode>,

    /// Start backends from ARENA_<PROTOCOL>_CMD before running
    #[arg(long)]
    pub spawn: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List the ARENA_* environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write a commented .env.example to the current directory and exit
    #[arg(long, conflicts_with = "env_help")]
    pub init_env: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(ref host) = self.host {
            if host.trim().is_empty() {
                return Err("--host cannot be empty".to_string());
            }
        }

        if self.count == Some(0) {
            return Err("--count must be at least 1".to_string());
        }

        if self.clients == Some(0) {
            return Err("--clients must be at least 1".to_string());
        }

        if self.batch_size == Some(0) {
            return Err("--batch-size must be at least 1".to_string());
        }

        if let Some(ref sizes) = self.payload_sizes {
            let parsed = crate::models::config::parse_u32_list(sizes)
                .map_err(|e| format!("Invalid --payload-sizes '{}': {}", sizes, e))?;
            if parsed.is_empty() || parsed.contains(&0) {
                return Err(format!("--payload-sizes needs positive values, got '{}'", sizes));
            }
        }

        Ok(())
    }

    /// Port overrides given on the command line
    pub fn port_overrides(&self) -> Vec<(Protocol, u16)> {
        [
            (Protocol::Rest, self.rest_port),
            (Protocol::GraphQL, self.graphql_port),
            (Protocol::Sse, self.sse_port),
            (Protocol::WebSocket, self.websocket_port),
            (Protocol::Grpc, self.grpc_port),
        ]
        .into_iter()
        .filter_map(|(protocol, port)| port.map(|port| (protocol, port)))
        .collect()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.json {
            false
        } else if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse throughput duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    parse_seconds(s, 300)
}

/// Parse request timeout from seconds string
fn parse_timeout(s: &str) -> Result<u64, String> {
    parse_seconds(s, 60)
}

fn parse_seconds(s: &str, max: u64) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > max {
                Err(format!("Duration cannot exceed {} seconds", max))
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
