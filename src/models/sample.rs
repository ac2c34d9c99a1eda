//! Per-request measurement records

use crate::types::{AppError, PerformanceLevel, Protocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a request did not count as a success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Backend unreachable or connection dropped
    Connection,
    /// Request exceeded its time budget
    Timeout,
    /// Bad status, malformed body or non-OK RPC status
    Protocol,
}

impl FailureKind {
    /// Classify an adapter error.
    ///
    /// Anything outside the sample-failure taxonomy is reported as a protocol
    /// failure so a misbehaving backend never aborts a run.
    pub fn from_error(error: &AppError) -> Self {
        match error {
            AppError::Connection(_) => Self::Connection,
            AppError::Timeout(_) => Self::Timeout,
            _ => Self::Protocol,
        }
    }
}

/// One recorded request outcome. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    protocol: Protocol,
    elapsed_ms: f64,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
    recorded_at: DateTime<Utc>,
}

impl Sample {
    /// Create a successful sample
    pub fn success(protocol: Protocol, elapsed: Duration) -> Self {
        Self {
            protocol,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            success: true,
            failure: None,
            recorded_at: Utc::now(),
        }
    }

    /// Create a failed sample
    pub fn failure(protocol: Protocol, elapsed: Duration, kind: FailureKind) -> Self {
        Self {
            protocol,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            success: false,
            failure: Some(kind),
            recorded_at: Utc::now(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceLevel::from_millis(self.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_sample() {
        let sample = Sample::success(Protocol::Rest, Duration::from_micros(4_500));
        assert!(sample.is_success());
        assert_eq!(sample.failure_kind(), None);
        assert!((sample.elapsed_ms() - 4.5).abs() < 1e-9);
        assert_eq!(sample.performance_level(), PerformanceLevel::Good);
    }

    #[test]
    fn test_failure_sample_keeps_kind() {
        let sample = Sample::failure(Protocol::Grpc, Duration::from_secs(2), FailureKind::Timeout);
        assert!(!sample.is_success());
        assert_eq!(sample.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(sample.protocol(), Protocol::Grpc);
    }

    #[test]
    fn test_failure_kind_from_error() {
        assert_eq!(FailureKind::from_error(&AppError::connection("refused")), FailureKind::Connection);
        assert_eq!(FailureKind::from_error(&AppError::timeout("2s")), FailureKind::Timeout);
        assert_eq!(FailureKind::from_error(&AppError::protocol("500")), FailureKind::Protocol);
        assert_eq!(FailureKind::from_error(&AppError::parse("bad json")), FailureKind::Protocol);
    }

    #[test]
    fn test_sample_serialization_omits_missing_failure() {
        let sample = Sample::success(Protocol::GraphQL, Duration::from_millis(3));
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["protocol"], "graphql");
        assert_eq!(json["success"], true);
        assert!(json.get("failure").is_none());
    }
}
