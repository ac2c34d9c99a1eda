//! Output formatting and display system
//!
//! This module renders suite reports as plain tables, colored tables or
//! JSON documents.

mod colored;
mod formatter;
mod json;

pub use colored::{level_color, ColorScheme, ColoredFormatter};
pub use formatter::{
    comparison_lines, Alignment, Cell, CellStyle, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData,
    TableFormat,
};
pub use json::JsonFormatter;

use crate::{error::Result, executor::SuiteReport, models::Config};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool, json: bool) -> Box<dyn OutputFormatter> {
        if json {
            return Box::new(JsonFormatter::new());
        }

        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    pub fn from_config(config: &Config) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.enable_color, config.verbose, config.json_output)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(OutputFormatterFactory::from_config(config))
    }

    /// Render a complete suite report
    pub fn display_report(&self, report: &SuiteReport) -> Result<String> {
        self.formatter.format_report(report)
    }

    pub fn display_warning(&self, warning: &str) -> Result<String> {
        self.formatter.format_warning(warning)
    }
}
