//! Error handling for the arena benchmark client

use thiserror::Error;

/// Custom error types for the arena benchmark client
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend unreachable or connection dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request exceeded its time budget
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Non-2xx status, malformed body or non-OK RPC status
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend failed its health probe before a run started
    #[error("Health check failed: {0}")]
    HealthCheck(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (URLs, JSON, numbers, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Spawning or stopping a backend process failed
    #[error("Server process error: {0}")]
    ServerProcess(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    pub fn health_check<S: Into<String>>(message: S) -> Self {
        Self::HealthCheck(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn server_process<S: Into<String>>(message: S) -> Self {
        Self::ServerProcess(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Connection(_) => "CONNECTION",
            Self::Timeout(_) => "TIMEOUT",
            Self::Protocol(_) => "PROTOCOL",
            Self::HealthCheck(_) => "HEALTH",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::Io(_) => "IO",
            Self::ServerProcess(_) => "SERVER",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Errors the engine records as a failed sample instead of aborting the run
    pub fn is_sample_failure(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_) | Self::Protocol(_))
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Connection(_) | Self::Protocol(_) => 2,
            Self::Timeout(_) => 3,
            Self::HealthCheck(_) => 4,
            Self::Io(_) => 5,
            Self::ServerProcess(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Connection(_) | Self::Protocol(_) | Self::HealthCheck(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::ServerProcess(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() {
            Self::connection(error.to_string())
        } else {
            Self::protocol(error.to_string())
        }
    }
}

impl From<tonic::transport::Error> for AppError {
    fn from(error: tonic::transport::Error) -> Self {
        Self::connection(error.to_string())
    }
}

impl From<tonic::Status> for AppError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unavailable => Self::connection(status.message().to_string()),
            tonic::Code::DeadlineExceeded => Self::timeout(status.message().to_string()),
            code => Self::protocol(format!("RPC status {:?}: {}", code, status.message())),
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on the console
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            if let Some(hint) = self.hint(error) {
                eprintln!();
                eprintln!("{}", hint);
            }
        }
    }

    /// Troubleshooting hint for errors the user can act on
    pub fn hint(&self, error: &AppError) -> Option<&'static str> {
        match error {
            AppError::Config(_) | AppError::Validation(_) | AppError::Parse(_) => {
                Some("Check your .env file, ARENA_* variables and command line flags.")
            }
            AppError::HealthCheck(_) | AppError::Connection(_) => {
                Some("Start the arena servers (or pass --spawn) and verify the ports with --mode health.")
            }
            AppError::Timeout(_) => {
                Some("Increase the per-request budget with --timeout or lower --limit.")
            }
            AppError::ServerProcess(_) => {
                Some("Check the ARENA_<PROTOCOL>_CMD commands and that the ports are free.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AppError::config("test message");
        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_sample_failure_taxonomy() {
        assert!(AppError::connection("refused").is_sample_failure());
        assert!(AppError::timeout("2s").is_sample_failure());
        assert!(AppError::protocol("500").is_sample_failure());
        assert!(!AppError::health_check("REST down").is_sample_failure());
        assert!(!AppError::config("bad").is_sample_failure());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("x").exit_code(), 1);
        assert_eq!(AppError::connection("x").exit_code(), 2);
        assert_eq!(AppError::timeout("x").exit_code(), 3);
        assert_eq!(AppError::health_check("x").exit_code(), 4);
        assert_eq!(AppError::io("x").exit_code(), 5);
        assert_eq!(AppError::server_process("x").exit_code(), 6);
        assert_eq!(AppError::internal("x").exit_code(), 99);
    }

    #[test]
    fn test_status_conversion() {
        let unavailable: AppError = tonic::Status::unavailable("down").into();
        assert!(matches!(unavailable, AppError::Connection(_)));

        let deadline: AppError = tonic::Status::deadline_exceeded("slow").into();
        assert!(matches!(deadline, AppError::Timeout(_)));

        let internal: AppError = tonic::Status::internal("boom").into();
        assert!(matches!(internal, AppError::Protocol(_)));
    }

    #[test]
    fn test_plain_console_format() {
        let error = AppError::timeout("request exceeded 2s");
        assert_eq!(
            error.format_for_console(false),
            "[TIMEOUT] Timeout error: request exceeded 2s"
        );
    }

    #[test]
    fn test_reporter_hints() {
        let reporter = ErrorReporter::new(false, true);
        assert!(reporter.hint(&AppError::health_check("down")).is_some());
        assert!(reporter.hint(&AppError::internal("bug")).is_none());
    }
}
