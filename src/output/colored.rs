//! Colored formatter implementation with terminal color support
//!
//! Tables share their layout with the plain formatter; cells are padded
//! first and colored afterwards.

use super::formatter::{
    comparison_lines, concurrency_table, health_table, latency_table, payload_table, ranking_table,
    throughput_table, write_error, CellStyle, FormattingOptions, OutputFormatter, RowData, TableFormat,
};
use crate::{
    error::Result,
    executor::{suite::SkippedRun, ConcurrencyRun, HealthReport, LatencyRun, PayloadSweep, ThroughputRun},
    stats::ProtocolRanking,
    types::PerformanceLevel,
};
use colored::*;
use std::fmt::Write as _;

/// Terminal color for a latency band
pub fn level_color(level: PerformanceLevel) -> Color {
    match level {
        PerformanceLevel::Good => Color::Green,
        PerformanceLevel::Moderate => Color::Yellow,
        PerformanceLevel::Poor => Color::Red,
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            highlight: Color::Magenta,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or untouched when colors are disabled
    fn emphasize(&self, text: &str, color: Color) -> String {
        if self.options.enable_color {
            text.bold().color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn style_cell(&self, style: CellStyle, padded: String) -> String {
        let color = match style {
            CellStyle::Plain => return padded,
            CellStyle::Latency(level) => level_color(level),
            CellStyle::Positive => self.color_scheme.success,
            CellStyle::Negative => self.color_scheme.error,
            CellStyle::Muted => self.color_scheme.muted,
        };
        self.colorize(&padded, color).to_string()
    }

    fn render(&self, format: &TableFormat, rows: &[RowData]) -> String {
        format.render_styled(rows, |style, padded| self.style_cell(style, padded))
    }

    /// Create a colored section header
    fn section(&self, title: &str, body: &str) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.emphasize(title, self.color_scheme.header)).map_err(write_error)?;
        write!(output, "{}", body).map_err(write_error)?;
        Ok(output)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "═".repeat(title.chars().count() + 4);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(write_error)?;
        writeln!(output, "  {}  ", self.emphasize(title, self.color_scheme.header)).map_err(write_error)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(write_error)?;

        Ok(output)
    }

    fn format_health(&self, report: &HealthReport) -> Result<String> {
        let (format, rows) = health_table(report, self.options.table_borders);
        let active = report.active_count();
        let color = if active == 0 { self.color_scheme.error } else { self.color_scheme.success };
        let summary = format!("{} of {} protocols active", active, report.probes.len());
        let body = format!("{}\n{}", self.render(&format, &rows), self.colorize(&summary, color));
        self.section("Health", &body)
    }

    fn format_latency(&self, runs: &[LatencyRun]) -> Result<String> {
        let (format, rows) = latency_table(runs, self.options.table_borders, self.options.verbose_mode);
        self.section("Latency", &self.render(&format, &rows))
    }

    fn format_throughput(&self, runs: &[ThroughputRun]) -> Result<String> {
        let (format, rows) = throughput_table(runs, self.options.table_borders);
        self.section("Throughput", &self.render(&format, &rows))
    }

    fn format_concurrency(&self, runs: &[ConcurrencyRun]) -> Result<String> {
        let (format, rows) = concurrency_table(runs, self.options.table_borders);
        self.section("Concurrency", &self.render(&format, &rows))
    }

    fn format_payload(&self, sweeps: &[PayloadSweep]) -> Result<String> {
        let (format, rows) = payload_table(sweeps, self.options.table_borders);
        self.section("Payload Size", &self.render(&format, &rows))
    }

    fn format_comparison(&self, rankings: &[ProtocolRanking]) -> Result<String> {
        let (format, rows) = ranking_table(rankings, self.options.table_borders);
        let mut body = self.render(&format, &rows);
        for (index, line) in comparison_lines(rankings).into_iter().enumerate() {
            body.push('\n');
            if index == 0 {
                body.push_str(&self.emphasize(&line, self.color_scheme.highlight));
            } else {
                body.push_str(&line);
            }
        }
        self.section("Comparison", &body)
    }

    fn format_skipped(&self, skipped: &[SkippedRun]) -> Result<String> {
        let lines: Vec<String> = skipped
            .iter()
            .map(|run| {
                let line = format!("{:?} on {}: {}", run.category, run.protocol, run.reason);
                self.colorize(&line, self.color_scheme.warning).to_string()
            })
            .collect();
        self.section("Skipped", &lines.join("\n"))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("ERROR:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("WARNING:", self.color_scheme.warning), warning))
    }
}
