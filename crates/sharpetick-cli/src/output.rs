//! Rendering of command results to stdout.

use std::io::Write;

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Column-aligned text rendering of a command result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths = self.headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate().take(columns) {
                widths[index] = widths[index].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&join_row(self.headers.iter().copied(), &widths));
        let rules = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();
        out.push_str(&join_row(rules.iter().map(String::as_str), &widths));
        for row in &self.rows {
            out.push_str(&join_row(row.iter().map(String::as_str), &widths));
        }
        out
    }
}

fn join_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned();
    line.push('\n');
    line
}

/// Result of one command: the JSON document, its table form, and whether
/// any ticker failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub data: Value,
    pub table: Table,
    pub has_errors: bool,
}

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let text = to_text(output, format, pretty)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes())?;
    handle.flush()?;
    Ok(())
}

fn to_text(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json if pretty => format!("{}\n", serde_json::to_string_pretty(&output.data)?),
        OutputFormat::Json => format!("{}\n", serde_json::to_string(&output.data)?),
        OutputFormat::Table => output.table.render(),
    })
}

/// Two-decimal number, or `-` when absent.
pub fn decimal(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |value| format!("{value:.2}"))
}
