//! Structured logging for the benchmark client
//!
//! Provides leveled, structured log entries with correlation ids so that
//! the events of one run (start, failed samples, completion) can be tied
//! together, plus JSON output for log aggregators.

use crate::error::{AppError, Result};
use crate::models::{Config, RunConfig, Sample};
use crate::client::HealthProbe;
use crate::types::{BenchmarkCategory, Protocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Severity of a log entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Reserved for failures that end the process
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Right-aligned level tag, colored per severity
    fn tag(&self, use_color: bool) -> String {
        let tag = format!("{:>5}", self.as_str());
        if !use_color {
            return tag;
        }
        match self {
            LogLevel::Trace => tag.white().to_string(),
            LogLevel::Debug => tag.cyan().to_string(),
            LogLevel::Info => tag.green().to_string(),
            LogLevel::Warn => tag.yellow().to_string(),
            LogLevel::Error => tag.red().to_string(),
            LogLevel::Fatal => tag.magenta().bold().to_string(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    /// Minimum log level to output; `None` silences the logger
    min_level: Option<LogLevel>,
    use_color: bool,
    format: LogFormat,
    /// Keep stdout free for the report (JSON mode)
    stderr_only: bool,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: Some(LogLevel::Info),
            use_color: true,
            format: LogFormat::Console,
            stderr_only: false,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Logger that drops every entry
    pub fn silent(name: String) -> Self {
        Self {
            min_level: None,
            ..Self::new(name)
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level: Some(min_level),
            use_color: config.enable_color && !config.json_output,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            stderr_only: config.json_output,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        self.min_level.map_or(false, |min| level >= min)
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if let Some(session_id) = &self.context.read().await.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }

        let output = self.format_entry(&entry);

        // Warnings and errors go to stderr
        if self.stderr_only || entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let mut output = format!(
            "{} {} [{}] {}",
            timestamp,
            entry.level.tag(self.use_color),
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add sample outcome fields
    pub fn sample(self, sample: &Sample) -> Self {
        self.field("protocol", sample.protocol())
            .field("elapsed_ms", sample.elapsed_ms())
            .field("success", sample.is_success())
            .field("failure", sample.failure_kind())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Specialized logger for benchmark runs
#[derive(Clone)]
pub struct BenchmarkLogger {
    logger: Logger,
}

impl BenchmarkLogger {
    pub fn new(config: &Config) -> Self {
        Self { logger: Logger::with_config("BENCH".to_string(), config) }
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn silent() -> Self {
        Self { logger: Logger::silent("BENCH".to_string()) }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the start of a run and return its correlation id
    pub async fn run_started(&self, run: &RunConfig) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        self.logger
            .info(&format!("Starting {} run against {}:{}", run.protocol, run.host, run.target_port))
            .correlation_id(&correlation_id)
            .field("protocol", run.protocol)
            .field("workload", run.workload)
            .field("limit", run.limit)
            .field("connection_mode", run.connection_mode)
            .log()
            .await;
        correlation_id
    }

    pub async fn run_completed(&self, correlation_id: &str, run: &RunConfig, successes: u64, failures: u64, elapsed: Duration) {
        let level = if failures > 0 { LogLevel::Warn } else { LogLevel::Info };
        self.logger
            .log(level, &format!(
                "Completed {} run: {} ok, {} failed in {:.3}s",
                run.protocol, successes, failures, elapsed.as_secs_f64()
            ))
            .correlation_id(correlation_id)
            .field("protocol", run.protocol)
            .field("successes", successes)
            .field("failures", failures)
            .field("elapsed_ms", elapsed.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    /// Failed samples are dropped from results; keep a trace at debug level
    pub async fn sample_failed(&self, correlation_id: &str, sample: &Sample) {
        self.logger
            .debug(&format!("{} request failed after {:.1}ms", sample.protocol(), sample.elapsed_ms()))
            .correlation_id(correlation_id)
            .sample(sample)
            .log()
            .await;
    }

    pub async fn health_probe(&self, probe: &HealthProbe) {
        let level = if probe.healthy { LogLevel::Debug } else { LogLevel::Info };
        let mut builder = self.logger
            .log(level, &format!(
                "{} on port {} is {}",
                probe.protocol,
                probe.port,
                if probe.healthy { "healthy" } else { "down" }
            ))
            .field("protocol", probe.protocol)
            .field("port", probe.port)
            .field("healthy", probe.healthy)
            .field("response_ms", probe.response_time.as_secs_f64() * 1000.0);
        if let Some(error) = &probe.error {
            builder = builder.field("error", error);
        }
        builder.log().await;
    }

    pub async fn run_skipped(&self, protocol: Protocol, category: BenchmarkCategory, error: &AppError) {
        self.logger
            .warn(&format!("Skipping {:?} run for {}: {}", category, protocol, error))
            .field("protocol", protocol)
            .field("category", category)
            .error_info(error)
            .log()
            .await;
    }
}

/// Logger factory holding the session id shared by every logger
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_benchmark_logger(&self) -> BenchmarkLogger {
        BenchmarkLogger::from_logger(self.create_logger("BENCH").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
