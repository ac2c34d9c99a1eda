//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::{config::parse_u32_list, Config},
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration.
    ///
    /// Precedence, lowest first: defaults, `.env`, process environment, CLI.
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::validation)?;

        let mut config = Config::default();

        self.load_env_file()?;

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Load .env file if it exists
    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(mode) = cli.mode {
            config.category = mode;
        }
        if !cli.protocols.is_empty() {
            config.protocols = Vec::new();
            for &protocol in &cli.protocols {
                if !config.protocols.contains(&protocol) {
                    config.protocols.push(protocol);
                }
            }
        }
        if let Some(ref host) = cli.host {
            config.host = host.trim().to_string();
        }
        for (protocol, port) in cli.port_overrides() {
            config.set_port(protocol, port);
        }

        if let Some(count) = cli.count {
            config.iterations = count;
            config.payload_iterations = count;
        }
        if let Some(limit) = cli.limit {
            config.limit = limit;
        }
        if let Some(ref sizes) = cli.payload_sizes {
            config.payload_sizes = parse_u32_list(sizes)?;
        }
        if let Some(duration) = cli.duration {
            config.duration_seconds = duration;
        }
        if let Some(batch_size) = cli.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(clients) = cli.clients {
            config.clients = clients;
        }
        if let Some(requests) = cli.requests_per_client {
            config.requests_per_client = requests;
        }
        if let Some(limit) = cli.concurrency_limit {
            config.concurrency_limit = limit;
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(mode) = cli.connection {
            config.connection_mode = mode;
        }

        if cli.color {
            config.enable_color = true;
        }
        if cli.no_color || cli.json {
            config.enable_color = false;
        }

        // CLI-only flags
        config.spawn_servers = cli.spawn;
        config.json_output = cli.json;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: category={:?}, protocols={:?}, timeout={}s, enable_color={}",
                config.category, config.protocols, config.timeout_seconds, config.enable_color
            );
        }

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    let parser = ConfigParser::new(cli);
    parser.parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    let endpoints: Vec<String> = config
        .protocols
        .iter()
        .map(|&p| format!("{}={}:{}", p.name(), config.host, config.port_for(p)))
        .collect();

    summary.push(format!("Category: {:?}", config.category));
    summary.push(format!("Endpoints: {}", endpoints.join(", ")));
    summary.push(format!("Iterations: {} (limit {})", config.iterations, config.limit));
    summary.push(format!("Payload Sizes: {:?}", config.payload_sizes));
    summary.push(format!(
        "Throughput: {}s window, batch {}",
        config.duration_seconds, config.batch_size
    ));
    summary.push(format!(
        "Concurrency: {} clients x {} requests (limit {})",
        config.clients, config.requests_per_client, config.concurrency_limit
    ));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Connection Mode: {:?}", config.connection_mode));
    summary.push(format!("Spawn Servers: {}", config.spawn_servers));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{BenchmarkCategory, ConnectionMode, Protocol};
    use clap::Parser;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    /// Serializes tests that touch process environment
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) fn env_guard() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            env::remove_var(name);
        }
        for protocol in Protocol::ALL {
            env::remove_var(format!("ARENA_{}_PORT", protocol.env_key()));
            env::remove_var(format!("ARENA_{}_CMD", protocol.env_key()));
        }
        guard
    }

    #[test]
    fn test_config_parser_defaults() {
        let _guard = env_guard();
        let config = ConfigParser::new(Cli::parse_from(["test"])).parse().unwrap();

        assert_eq!(config.category, BenchmarkCategory::All);
        assert_eq!(config.protocols.len(), 5);
        assert_eq!(config.iterations, crate::defaults::DEFAULT_ITERATIONS);
        assert_eq!(config.connection_mode, ConnectionMode::Fresh);
        assert!(!config.spawn_servers);
    }

    #[test]
    fn test_cli_overrides() {
        let _guard = env_guard();
        let cli = Cli::parse_from([
            "test", "-m", "latency", "-p", "grpc", "-p", "grpc", "-p", "rest", "-n", "7", "--grpc-port", "6000",
            "--no-color", "--connection", "shared",
        ]);
        let config = ConfigParser::new(cli).parse().unwrap();

        assert_eq!(config.category, BenchmarkCategory::Latency);
        assert_eq!(config.protocols, vec![Protocol::Grpc, Protocol::Rest]);
        assert_eq!(config.iterations, 7);
        assert_eq!(config.payload_iterations, 7);
        assert_eq!(config.grpc_port, 6000);
        assert_eq!(config.connection_mode, ConnectionMode::Shared);
        assert!(!config.enable_color);
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        let _guard = env_guard();
        env::set_var("ARENA_ITERATIONS", "8");
        env::set_var("ARENA_HOST", "env-host");

        let config = ConfigParser::new(Cli::parse_from(["test", "--count", "12"])).parse().unwrap();
        assert_eq!(config.iterations, 12);
        assert_eq!(config.host, "env-host");

        env::remove_var("ARENA_ITERATIONS");
        env::remove_var("ARENA_HOST");
    }

    #[test]
    fn test_env_commands_enable_spawn() {
        let _guard = env_guard();
        env::set_var("ARENA_REST_CMD", "python rest.py");

        let config = ConfigParser::new(Cli::parse_from(["test", "--spawn"])).parse().unwrap();
        assert!(config.spawn_servers);
        assert_eq!(config.server_commands.get(&Protocol::Rest).map(String::as_str), Some("python rest.py"));

        env::remove_var("ARENA_REST_CMD");
    }

    #[test]
    fn test_spawn_without_commands_fails() {
        let _guard = env_guard();
        let result = ConfigParser::new(Cli::parse_from(["test", "--spawn"])).parse();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_env_value_fails() {
        let _guard = env_guard();
        env::set_var("ARENA_CLIENTS", "many");
        let result = ConfigParser::new(Cli::parse_from(["test"])).parse();
        env::remove_var("ARENA_CLIENTS");
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_conflict_is_validation_error() {
        let _guard = env_guard();
        let result = load_config(Cli::parse_from(["test", "--color", "--no-color"]));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_json_disables_color() {
        let _guard = env_guard();
        let config = load_config(Cli::parse_from(["test", "--json"])).unwrap();
        assert!(config.json_output);
        assert!(!config.enable_color);
    }

    #[test]
    fn test_config_summary() {
        let config = Config::default();
        let summary = display_config_summary(&config);

        assert!(summary.contains("Category: All"));
        assert!(summary.contains("gRPC=localhost:50051"));
        assert!(summary.contains("Timeout: 2s"));
    }
}
