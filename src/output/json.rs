//! Machine-readable report output

use super::formatter::{comparison_lines, OutputFormatter};
use crate::{
    error::{AppError, Result},
    executor::{suite::SkippedRun, ConcurrencyRun, HealthReport, LatencyRun, PayloadSweep, SuiteReport, ThroughputRun},
    stats::ProtocolRanking,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Emits pretty-printed JSON; every section is a standalone document
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(AppError::from)
    }

    /// Report document with the derived ranking and comparison lines
    pub fn report_value(&self, report: &SuiteReport) -> Result<Value> {
        let rankings = report.rankings();
        let mut value = serde_json::to_value(report)?;
        if let Value::Object(map) = &mut value {
            map.insert("active_protocols".to_string(), serde_json::to_value(report.health.active())?);
            map.insert("comparison".to_string(), json!(comparison_lines(&rankings)));
            map.insert("rankings".to_string(), serde_json::to_value(rankings)?);
        }
        Ok(value)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        self.to_json(&json!({ "title": title }))
    }

    fn format_health(&self, report: &HealthReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_latency(&self, runs: &[LatencyRun]) -> Result<String> {
        self.to_json(runs)
    }

    fn format_throughput(&self, runs: &[ThroughputRun]) -> Result<String> {
        self.to_json(runs)
    }

    fn format_concurrency(&self, runs: &[ConcurrencyRun]) -> Result<String> {
        self.to_json(runs)
    }

    fn format_payload(&self, sweeps: &[PayloadSweep]) -> Result<String> {
        self.to_json(sweeps)
    }

    fn format_comparison(&self, rankings: &[ProtocolRanking]) -> Result<String> {
        self.to_json(&json!({
            "rankings": rankings,
            "comparison": comparison_lines(rankings),
        }))
    }

    fn format_skipped(&self, skipped: &[SkippedRun]) -> Result<String> {
        self.to_json(skipped)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        self.to_json(&json!({ "error": error }))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        self.to_json(&json!({ "warning": warning }))
    }

    fn format_report(&self, report: &SuiteReport) -> Result<String> {
        self.to_json(&self.report_value(report)?)
    }
}
