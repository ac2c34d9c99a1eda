//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    executor::{
        suite::{SkippedRun, BASELINE_PROTOCOL},
        ConcurrencyRun, HealthReport, LatencyRun, PayloadSweep, SuiteReport, ThroughputRun,
    },
    stats::{LatencySummary, ProtocolRanking},
    types::PerformanceLevel,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the per-protocol health table
    fn format_health(&self, report: &HealthReport) -> Result<String>;

    fn format_latency(&self, runs: &[LatencyRun]) -> Result<String>;

    fn format_throughput(&self, runs: &[ThroughputRun]) -> Result<String>;

    fn format_concurrency(&self, runs: &[ConcurrencyRun]) -> Result<String>;

    /// Format payload sweeps, one row per (protocol, limit)
    fn format_payload(&self, sweeps: &[PayloadSweep]) -> Result<String>;

    /// Format the ranking and speed-up summary
    fn format_comparison(&self, rankings: &[ProtocolRanking]) -> Result<String>;

    fn format_skipped(&self, skipped: &[SkippedRun]) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format a complete suite report.
    ///
    /// Health comes first, followed by each category that produced runs
    /// and the comparison when anything was ranked.
    fn format_report(&self, report: &SuiteReport) -> Result<String> {
        let mut sections = vec![
            self.format_header("Protocol Arena Results")?,
            self.format_health(&report.health)?,
        ];

        if report.health.active_count() == 0 {
            sections.push(self.format_warning("0 active protocols: no backend passed its health check")?);
        }
        if !report.latency.is_empty() {
            sections.push(self.format_latency(&report.latency)?);
        }
        if !report.throughput.is_empty() {
            sections.push(self.format_throughput(&report.throughput)?);
        }
        if !report.concurrency.is_empty() {
            sections.push(self.format_concurrency(&report.concurrency)?);
        }
        if !report.payload.is_empty() {
            sections.push(self.format_payload(&report.payload)?);
        }
        if !report.skipped.is_empty() {
            sections.push(self.format_skipped(&report.skipped)?);
        }

        let rankings = report.rankings();
        if !rankings.is_empty() {
            sections.push(self.format_comparison(&rankings)?);
        }

        Ok(sections.join("\n\n"))
    }
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Add spread columns (p99, std dev, min/max) to latency tables
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), alignment: Alignment::Left }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), alignment: Alignment::Right }
    }

    pub fn center(header: impl Into<String>) -> Self {
        Self { header: header.into(), alignment: Alignment::Center }
    }
}

/// How a cell should be highlighted by formatters that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    Latency(PerformanceLevel),
    Positive,
    Negative,
    Muted,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), style: CellStyle::Plain }
    }

    pub fn styled(text: impl Into<String>, style: CellStyle) -> Self {
        Self { text: text.into(), style }
    }

    /// Millisecond value, banded by performance level
    pub fn latency_ms(ms: f64) -> Self {
        Self::styled(format_duration(ms), CellStyle::Latency(PerformanceLevel::from_millis(ms)))
    }

    pub fn missing() -> Self {
        Self::styled("N/A", CellStyle::Muted)
    }
}

/// Row data for table formatting
pub type RowData = Vec<Cell>;

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
}

impl TableFormat {
    pub fn new(columns: Vec<Column>, show_borders: bool) -> Self {
        Self { columns, show_borders }
    }

    /// Render without highlighting
    pub fn render(&self, rows: &[RowData]) -> String {
        self.render_styled(rows, |_, padded| padded)
    }

    /// Render, passing each padded data cell through `style`.
    ///
    /// Cells are padded before styling so escape codes never skew widths.
    pub fn render_styled<F>(&self, rows: &[RowData], style: F) -> String
    where
        F: Fn(CellStyle, String) -> String,
    {
        let widths = self.column_widths(rows);
        let mut lines = Vec::new();

        if self.show_borders {
            lines.push(horizontal_border(&widths));
        }
        let headers: RowData = self.columns.iter().map(|c| Cell::plain(c.header.clone())).collect();
        lines.push(self.create_row(&headers, &widths, &|_, padded| padded));
        if self.show_borders {
            lines.push(horizontal_border(&widths));
        }

        for row in rows {
            lines.push(self.create_row(row, &widths, &style));
        }

        if self.show_borders {
            lines.push(horizontal_border(&widths));
        }

        lines.join("\n")
    }

    fn column_widths(&self, rows: &[RowData]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                rows.iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.text.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(column.header.chars().count())
            })
            .collect()
    }

    fn create_row<F>(&self, cells: &[Cell], widths: &[usize], style: &F) -> String
    where
        F: Fn(CellStyle, String) -> String,
    {
        let mut row = String::new();
        if self.show_borders {
            row.push('|');
        }

        for (index, (cell, &width)) in cells.iter().zip(widths.iter()).enumerate() {
            let alignment = self.columns.get(index).map(|c| c.alignment).unwrap_or(Alignment::Left);
            let padded = style(cell.style, align_text(&cell.text, width, alignment));

            if self.show_borders {
                row.push(' ');
                row.push_str(&padded);
                row.push_str(" |");
            } else {
                row.push_str(&padded);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }
}

fn horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for &width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Align text within specified width
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let padding = width - len;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.0}μs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.2}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

pub fn format_rate(requests_per_second: f64) -> String {
    format!("{:.1} req/s", requests_per_second)
}

fn summary_cells(summary: Option<&LatencySummary>, extended: bool) -> Vec<Cell> {
    match summary {
        Some(s) => {
            let mut cells = vec![Cell::latency_ms(s.mean_ms), Cell::latency_ms(s.p50_ms), Cell::latency_ms(s.p95_ms)];
            if extended {
                cells.push(Cell::latency_ms(s.p99_ms));
                cells.push(Cell::plain(format_duration(s.std_dev_ms)));
                cells.push(Cell::plain(format!("{}/{}", format_duration(s.min_ms), format_duration(s.max_ms))));
            }
            cells
        }
        None => {
            let width = if extended { 6 } else { 3 };
            (0..width).map(|_| Cell::missing()).collect()
        }
    }
}

fn summary_columns(extended: bool) -> Vec<Column> {
    let mut columns = vec![Column::right("Mean"), Column::right("p50"), Column::right("p95")];
    if extended {
        columns.push(Column::right("p99"));
        columns.push(Column::right("Std Dev"));
        columns.push(Column::right("Min/Max"));
    }
    columns
}

pub fn health_table(report: &HealthReport, borders: bool) -> (TableFormat, Vec<RowData>) {
    let format = TableFormat::new(
        vec![
            Column::left("Protocol"),
            Column::right("Port"),
            Column::center("Status"),
            Column::right("Response"),
            Column::left("Detail"),
        ],
        borders,
    );

    let rows = report
        .probes
        .iter()
        .map(|probe| {
            let status = if probe.healthy {
                Cell::styled("UP", CellStyle::Positive)
            } else {
                Cell::styled("DOWN", CellStyle::Negative)
            };
            let detail = match &probe.error {
                Some(error) => Cell::styled(error.clone(), CellStyle::Muted),
                None if !probe.protocol.is_benchmarkable() => Cell::styled("health only", CellStyle::Muted),
                None => Cell::plain(""),
            };
            vec![
                Cell::plain(probe.protocol.name()),
                Cell::plain(probe.port.to_string()),
                status,
                Cell::latency_ms(probe.response_time.as_secs_f64() * 1000.0),
                detail,
            ]
        })
        .collect();

    (format, rows)
}

pub fn latency_table(runs: &[LatencyRun], borders: bool, extended: bool) -> (TableFormat, Vec<RowData>) {
    let mut columns = vec![
        Column::left("Protocol"),
        Column::right("Limit"),
        Column::right("OK"),
        Column::right("Failed"),
        Column::right("Success"),
    ];
    columns.extend(summary_columns(extended));

    let rows = runs
        .iter()
        .map(|run| {
            let success = run.success_rate();
            let mut row = vec![
                Cell::plain(run.protocol.name()),
                Cell::plain(run.limit.to_string()),
                Cell::plain(run.samples.len().to_string()),
                failures_cell(run.failures as u64),
                Cell::styled(format_percentage(success), success_style(success)),
            ];
            row.extend(summary_cells(run.summary.as_ref(), extended));
            row
        })
        .collect();

    (TableFormat::new(columns, borders), rows)
}

pub fn throughput_table(runs: &[ThroughputRun], borders: bool) -> (TableFormat, Vec<RowData>) {
    let format = TableFormat::new(
        vec![
            Column::left("Protocol"),
            Column::right("Window"),
            Column::right("Batch"),
            Column::right("Batches"),
            Column::right("OK"),
            Column::right("Failed"),
            Column::right("Elapsed"),
            Column::right("Rate"),
        ],
        borders,
    );

    let rows = runs
        .iter()
        .map(|run| {
            vec![
                Cell::plain(run.protocol.name()),
                Cell::plain(format_duration(run.window.as_secs_f64() * 1000.0)),
                Cell::plain(run.batch_size.to_string()),
                Cell::plain(run.batches.to_string()),
                Cell::plain(run.successes.to_string()),
                failures_cell(run.failures),
                Cell::plain(format_duration(run.elapsed.as_secs_f64() * 1000.0)),
                Cell::styled(format_rate(run.requests_per_second), CellStyle::Positive),
            ]
        })
        .collect();

    (format, rows)
}

pub fn concurrency_table(runs: &[ConcurrencyRun], borders: bool) -> (TableFormat, Vec<RowData>) {
    let mut columns = vec![
        Column::left("Protocol"),
        Column::right("Clients"),
        Column::right("Req/Client"),
        Column::right("OK"),
        Column::right("Failed"),
        Column::right("Elapsed"),
        Column::right("Rate"),
    ];
    columns.extend(summary_columns(false));

    let rows = runs
        .iter()
        .map(|run| {
            let mut row = vec![
                Cell::plain(run.protocol.name()),
                Cell::plain(run.clients.to_string()),
                Cell::plain(run.requests_per_client.to_string()),
                Cell::plain(run.successes().to_string()),
                failures_cell(run.failures),
                Cell::plain(format_duration(run.elapsed.as_secs_f64() * 1000.0)),
                Cell::styled(format_rate(run.requests_per_second), CellStyle::Positive),
            ];
            row.extend(summary_cells(run.summary.as_ref(), false));
            row
        })
        .collect();

    (TableFormat::new(columns, borders), rows)
}

pub fn payload_table(sweeps: &[PayloadSweep], borders: bool) -> (TableFormat, Vec<RowData>) {
    let mut columns = vec![Column::left("Protocol"), Column::right("Limit"), Column::right("OK")];
    columns.extend(summary_columns(false));

    let rows = sweeps
        .iter()
        .flat_map(|sweep| sweep.points.iter())
        .map(|point| {
            let mut row = vec![
                Cell::plain(point.protocol.name()),
                Cell::plain(point.limit.to_string()),
                Cell::plain(format!("{}/{}", point.samples.len(), point.requested)),
            ];
            row.extend(summary_cells(point.summary.as_ref(), false));
            row
        })
        .collect();

    (TableFormat::new(columns, borders), rows)
}

pub fn ranking_table(rankings: &[ProtocolRanking], borders: bool) -> (TableFormat, Vec<RowData>) {
    let format = TableFormat::new(
        vec![
            Column::right("Rank"),
            Column::left("Protocol"),
            Column::right("Mean"),
            Column::right(format!("vs {}", BASELINE_PROTOCOL)),
        ],
        borders,
    );

    let rows = rankings
        .iter()
        .map(|ranking| {
            let speedup = match ranking.speedup_vs_baseline {
                Some(ratio) if ratio >= 1.0 => Cell::styled(format!("{:.2}x", ratio), CellStyle::Positive),
                Some(ratio) => Cell::styled(format!("{:.2}x", ratio), CellStyle::Negative),
                None => Cell::missing(),
            };
            vec![
                Cell::plain(ranking.rank.to_string()),
                Cell::plain(ranking.protocol.name()),
                Cell::latency_ms(ranking.mean_ms),
                speedup,
            ]
        })
        .collect();

    (format, rows)
}

/// Sentences naming the fastest protocol and each speed-up against the baseline
pub fn comparison_lines(rankings: &[ProtocolRanking]) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(fastest) = rankings.first() else {
        return lines;
    };
    lines.push(format!("Fastest: {} ({} mean)", fastest.protocol, format_duration(fastest.mean_ms)));

    let baseline_measured = rankings.iter().any(|r| r.protocol == BASELINE_PROTOCOL);
    if !baseline_measured {
        lines.push(format!("{} was not measured; no speed-up ratios", BASELINE_PROTOCOL));
        return lines;
    }

    for ranking in rankings.iter().filter(|r| r.protocol != BASELINE_PROTOCOL) {
        match ranking.speedup_vs_baseline {
            Some(ratio) if ratio >= 1.0 => {
                lines.push(format!("{} was {:.1}x faster than {}", ranking.protocol, ratio, BASELINE_PROTOCOL));
            }
            Some(ratio) => {
                lines.push(format!("{} was {:.1}x slower than {}", ranking.protocol, 1.0 / ratio, BASELINE_PROTOCOL));
            }
            None => {}
        }
    }
    lines
}

fn failures_cell(failures: u64) -> Cell {
    if failures == 0 {
        Cell::plain("0")
    } else {
        Cell::styled(failures.to_string(), CellStyle::Negative)
    }
}

fn success_style(percentage: f64) -> CellStyle {
    if percentage >= 95.0 {
        CellStyle::Positive
    } else {
        CellStyle::Negative
    }
}

pub(crate) fn write_error(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    fn section(&self, title: &str, body: &str) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}:", title).map_err(write_error)?;
        writeln!(output, "{}", "-".repeat(title.len() + 1)).map_err(write_error)?;
        write!(output, "{}", body).map_err(write_error)?;
        Ok(output)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(write_error)?;
        writeln!(output, "  {}  ", title).map_err(write_error)?;
        write!(output, "{}", border).map_err(write_error)?;

        Ok(output)
    }

    fn format_health(&self, report: &HealthReport) -> Result<String> {
        let (format, rows) = health_table(report, self.options.table_borders);
        let body = format!(
            "{}\n{} of {} protocols active",
            format.render(&rows),
            report.active_count(),
            report.probes.len()
        );
        self.section("Health", &body)
    }

    fn format_latency(&self, runs: &[LatencyRun]) -> Result<String> {
        let (format, rows) = latency_table(runs, self.options.table_borders, self.options.verbose_mode);
        self.section("Latency", &format.render(&rows))
    }

    fn format_throughput(&self, runs: &[ThroughputRun]) -> Result<String> {
        let (format, rows) = throughput_table(runs, self.options.table_borders);
        self.section("Throughput", &format.render(&rows))
    }

    fn format_concurrency(&self, runs: &[ConcurrencyRun]) -> Result<String> {
        let (format, rows) = concurrency_table(runs, self.options.table_borders);
        self.section("Concurrency", &format.render(&rows))
    }

    fn format_payload(&self, sweeps: &[PayloadSweep]) -> Result<String> {
        let (format, rows) = payload_table(sweeps, self.options.table_borders);
        self.section("Payload Size", &format.render(&rows))
    }

    fn format_comparison(&self, rankings: &[ProtocolRanking]) -> Result<String> {
        let (format, rows) = ranking_table(rankings, self.options.table_borders);
        let mut body = format.render(&rows);
        for line in comparison_lines(rankings) {
            body.push('\n');
            body.push_str(&line);
        }
        self.section("Comparison", &body)
    }

    fn format_skipped(&self, skipped: &[SkippedRun]) -> Result<String> {
        let lines: Vec<String> = skipped
            .iter()
            .map(|run| format!("{:?} on {}: {}", run.category, run.protocol, run.reason))
            .collect();
        self.section("Skipped", &lines.join("\n"))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }
}
