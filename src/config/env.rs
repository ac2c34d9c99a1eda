//! Environment variable handling and .env file management

use crate::{
    error::{AppError, Result},
    models::config::{parse_protocol_list, parse_u32_list},
    types::Protocol,
};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Protocol Arena Benchmark Configuration
#
# Values here are defaults; command-line arguments override them.

# Host every backend listens on
# ARENA_HOST=localhost

# Protocols to probe and benchmark (comma-separated)
# ARENA_PROTOCOLS=rest,graphql,grpc,sse,websocket

# Backend ports
# ARENA_REST_PORT=8000
# ARENA_GRAPHQL_PORT=8001
# ARENA_SSE_PORT=8002
# ARENA_WEBSOCKET_PORT=8003
# ARENA_GRPC_PORT=50051

# Sequential requests per latency run
# ARENA_ITERATIONS=50

# Records requested per log fetch
# ARENA_LIMIT=1

# limit values swept by payload runs
# ARENA_PAYLOAD_SIZES=1,100,1000

# Throughput window and batch size
# ARENA_DURATION_SECONDS=3
# ARENA_BATCH_SIZE=20

# Concurrency runs
# ARENA_CLIENTS=10
# ARENA_REQUESTS_PER_CLIENT=10

# Per-request timeout in seconds
# ARENA_TIMEOUT_SECONDS=2

# Enable colored output (true/false)
# ARENA_ENABLE_COLOR=true

# Commands used by --spawn to start each backend:
# ARENA_REST_CMD=uv run python src/servers/rest.py
# ARENA_GRAPHQL_CMD=uv run python src/servers/gql.py
# ARENA_SSE_CMD=uv run python src/servers/sse.py
# ARENA_WEBSOCKET_CMD=uv run python src/servers/ws.py
# ARENA_GRPC_CMD=uv run python src/servers/grpc_impl.py
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "ARENA_HOST" => {
                if value.is_empty() {
                    return Err(AppError::config("ARENA_HOST cannot be empty"));
                }
            }
            "ARENA_PROTOCOLS" => {
                parse_protocol_list(value)
                    .map_err(|e| AppError::config(format!("Invalid ARENA_PROTOCOLS value '{}': {}", value, e)))?;
            }
            "ARENA_PAYLOAD_SIZES" => {
                let sizes = parse_u32_list(value)
                    .map_err(|e| AppError::config(format!("Invalid ARENA_PAYLOAD_SIZES value '{}': {}", value, e)))?;
                if sizes.is_empty() || sizes.contains(&0) {
                    return Err(AppError::config("ARENA_PAYLOAD_SIZES needs positive values"));
                }
            }
            "ARENA_ITERATIONS" | "ARENA_LIMIT" | "ARENA_BATCH_SIZE" | "ARENA_CLIENTS"
            | "ARENA_REQUESTS_PER_CLIENT" => {
                let number: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if number == 0 {
                    return Err(AppError::config(format!("{} must be at least 1", key)));
                }
            }
            "ARENA_DURATION_SECONDS" => Self::validate_seconds(key, value, 300)?,
            "ARENA_TIMEOUT_SECONDS" => Self::validate_seconds(key, value, 60)?,
            "ARENA_ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ARENA_ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ if key.starts_with("ARENA_") && key.ends_with("_PORT") => {
                let port: u16 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if port == 0 {
                    return Err(AppError::config(format!("{} cannot be 0", key)));
                }
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    fn validate_seconds(key: &str, value: &str, max: u64) -> Result<()> {
        let secs: u64 = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if secs == 0 || secs > max {
            return Err(AppError::config(format!("{} must be between 1 and {}, got: {}", key, max, secs)));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("ARENA_HOST", "Host every backend listens on", "localhost"),
            ("ARENA_PROTOCOLS", "Comma-separated protocols to include", "rest,grpc"),
            ("ARENA_REST_PORT", "REST backend port", "8000"),
            ("ARENA_GRAPHQL_PORT", "GraphQL backend port", "8001"),
            ("ARENA_SSE_PORT", "SSE backend port", "8002"),
            ("ARENA_WEBSOCKET_PORT", "WebSocket backend port", "8003"),
            ("ARENA_GRPC_PORT", "gRPC backend port", "50051"),
            ("ARENA_ITERATIONS", "Sequential requests per latency run", "50"),
            ("ARENA_LIMIT", "Records requested per log fetch", "1"),
            ("ARENA_PAYLOAD_SIZES", "Comma-separated limit values for payload runs", "1,100,1000"),
            ("ARENA_DURATION_SECONDS", "Throughput window in seconds (1-300)", "3"),
            ("ARENA_BATCH_SIZE", "Concurrent requests per throughput batch", "20"),
            ("ARENA_CLIENTS", "Logical clients in concurrency runs", "10"),
            ("ARENA_REQUESTS_PER_CLIENT", "Requests issued by each client", "10"),
            ("ARENA_TIMEOUT_SECONDS", "Per-request timeout in seconds (1-60)", "2"),
            ("ARENA_ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Names of the per-protocol server command variables
    pub fn command_vars() -> Vec<String> {
        Protocol::ALL
            .iter()
            .map(|p| format!("ARENA_{}_CMD", p.env_key()))
            .collect()
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }
        help.push_str(&format!(
            "  {:<26} Shell command started by --spawn\n\n",
            "ARENA_<PROTOCOL>_CMD"
        ));

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Check if .env file exists and validate its contents
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read .env file: {}", e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
        for name in EnvManager::command_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Protocol Arena Benchmark Configuration"));
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("ARENA_HOST", "arena.local").is_ok());
        assert!(EnvManager::validate_env_var("ARENA_PROTOCOLS", "rest, grpc").is_ok());
        assert!(EnvManager::validate_env_var("ARENA_GRPC_PORT", "50051").is_ok());
        assert!(EnvManager::validate_env_var("ARENA_PAYLOAD_SIZES", "1,100").is_ok());
        assert!(EnvManager::validate_env_var("ARENA_TIMEOUT_SECONDS", "60").is_ok());
        assert!(EnvManager::validate_env_var("ARENA_ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("UNRELATED", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("ARENA_HOST", " ").is_err());
        assert!(EnvManager::validate_env_var("ARENA_PROTOCOLS", "rest,soap").is_err());
        assert!(EnvManager::validate_env_var("ARENA_REST_PORT", "70000").is_err());
        assert!(EnvManager::validate_env_var("ARENA_REST_PORT", "0").is_err());
        assert!(EnvManager::validate_env_var("ARENA_PAYLOAD_SIZES", "1,0").is_err());
        assert!(EnvManager::validate_env_var("ARENA_ITERATIONS", "0").is_err());
        assert!(EnvManager::validate_env_var("ARENA_TIMEOUT_SECONDS", "61").is_err());
        assert!(EnvManager::validate_env_var("ARENA_DURATION_SECONDS", "301").is_err());
        assert!(EnvManager::validate_env_var("ARENA_ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "# comment\nARENA_HOST=localhost\nARENA_CLIENTS=none\nARENA_GRPC_PORT=50051\n",
        )
        .unwrap();

        let warnings = EnvManager::check_env_file(temp_file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ARENA_CLIENTS"));
    }

    #[test]
    fn test_missing_env_file() {
        let path = std::env::temp_dir().join("arena-bench-no-such-file.env");
        assert!(EnvManager::check_env_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("ARENA_GRPC_PORT"));
        assert!(help.contains("ARENA_<PROTOCOL>_CMD"));
        assert!(help.contains("Configuration Priority"));
    }
}
