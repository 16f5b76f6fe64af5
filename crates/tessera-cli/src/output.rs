//! Output formatting and writing utilities
//!
//! This module renders validation reports in the CLI's output formats:
//! machine-readable JSON and YAML, or an annotated human-readable listing.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tessera_schema::ValidationResults;
use tracing::trace;

/// Outcome of validating one instance document
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub instance: PathBuf,
    pub results: ValidationResults,
}

impl InstanceReport {
    pub fn new(instance: &Path, results: ValidationResults) -> Self {
        Self {
            instance: instance.to_path_buf(),
            results,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.results.is_valid
    }

    /// The report in its machine-readable shape
    pub fn to_json(&self) -> Value {
        json!({
            "instance": self.instance.display().to_string(),
            "valid": self.results.is_valid,
            "results": self.results.to_json(),
        })
    }
}

/// Trait for formatting output
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format validation reports; `use_color` only affects human output
    fn format_reports(&self, reports: &[InstanceReport], use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_reports(&self, reports: &[InstanceReport], use_color: bool) -> Result<String> {
        if *self == OutputFormat::Human {
            return Ok(reports
                .iter()
                .map(|report| format_report_human(report, use_color))
                .collect());
        }

        let value = match reports {
            [single] => single.to_json(),
            many => Value::Array(many.iter().map(InstanceReport::to_json).collect()),
        };
        let mut formatted = self.format(&value)?;
        if !formatted.ends_with('\n') {
            formatted.push('\n');
        }
        Ok(formatted)
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write validation reports
    ///
    /// In quiet human mode only failing instances are listed.
    pub fn reports(&mut self, reports: &[InstanceReport]) -> Result<()> {
        let shown: Vec<InstanceReport> = if self.quiet && self.format == OutputFormat::Human {
            reports.iter().filter(|report| !report.is_valid()).cloned().collect()
        } else {
            reports.to_vec()
        };
        trace!(count = shown.len(), "Writing validation reports");
        let formatted = self.format.format_reports(&shown, self.use_color)?;
        self.write(&formatted)
    }
}

/// Format one report for human reading
///
/// Failures are listed as failing leaves: the instance location, the keyword
/// location and the rendered message.
fn format_report_human(report: &InstanceReport, use_color: bool) -> String {
    let name = report.instance.display().to_string();
    let mut output = String::new();

    if report.is_valid() {
        let line = format!("✓ {} is valid", name);
        output.push_str(&paint(&line, use_color, |s| s.green().to_string()));
        output.push('\n');
        return output;
    }

    let line = format!("✗ {} is invalid", name);
    output.push_str(&paint(&line, use_color, |s| s.red().bold().to_string()));
    output.push('\n');

    for leaf in report.results.failing_leaves() {
        let instance = display_pointer(&leaf.instance_location.to_string());
        let keyword = display_pointer(&leaf.relative_location.to_string());
        let location = format!("at {} ({})", instance, keyword);
        output.push_str("  ");
        output.push_str(&paint(&location, use_color, |s| s.dimmed().to_string()));
        if let Some(message) = &leaf.error_message {
            output.push_str(": ");
            output.push_str(message);
        }
        output.push('\n');
    }

    output
}

fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "#".to_string()
    } else {
        format!("#{}", pointer)
    }
}

fn paint(text: &str, use_color: bool, style: impl Fn(&str) -> String) -> String {
    if use_color {
        style(text)
    } else {
        text.to_string()
    }
}
