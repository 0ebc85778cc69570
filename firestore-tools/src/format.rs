//! Output formatting utilities for the CLI
//!
//! Provides the streaming visit printer used by `read`, plus table and JSON
//! formatting with colors for the other commands.

use anyhow::Result;
use colored::*;
use firestore_tools_core::{NodeKind, Visit, VisitSink, WalkSummary};
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

use crate::config::CliConfig;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable progress lines
    Text,
    /// One JSON object per line
    Json,
    /// Bare paths
    Paths,
}

impl OutputFormat {
    /// Map a configuration value to a format; unknown values fall back to text.
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "paths" => OutputFormat::Paths,
            _ => OutputFormat::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Paths => "paths",
        }
    }
}

/// Writes every visit to `W` as soon as it is emitted
pub struct LinePrinter<W: Write + Send> {
    out: W,
    format: OutputFormat,
}

impl<W: Write + Send> LinePrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_visit(&mut self, visit: &Visit) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let label = match visit.kind {
                    NodeKind::Collection => "Reading collection:",
                    NodeKind::Document => "Reading document:",
                };
                writeln!(self.out, "{} {}", label.dimmed(), visit.path)?;
                writeln!(self.out, "{}", visit.id)?;
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(visit)?;
                writeln!(self.out, "{}", line)?;
            }
            OutputFormat::Paths => writeln!(self.out, "{}", visit.path)?,
        }
        self.out.flush()
    }
}

impl<W: Write + Send> VisitSink for LinePrinter<W> {
    fn emit(&mut self, visit: &Visit) -> firestore_tools_core::Result<()> {
        Ok(self.write_visit(visit)?)
    }
}

/// Format the end-of-walk summary line
pub fn format_summary(summary: &WalkSummary) -> String {
    let mut line = format!(
        "Read {} collections and {} documents",
        summary.collections.to_string().cyan(),
        summary.documents.to_string().cyan()
    );
    if summary.skipped > 0 {
        line.push_str(&format!(
            " ({} duplicate paths skipped)",
            summary.skipped.to_string().yellow()
        ));
    }
    format_success(&line)
}

/// Format CLI configuration
pub fn format_config(config: &CliConfig, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Text | OutputFormat::Paths => {
            #[derive(Tabled)]
            struct SettingRow {
                #[tabled(rename = "Setting")]
                key: &'static str,
                #[tabled(rename = "Value")]
                value: String,
            }

            let unset = || "-".dimmed().to_string();
            let rows = vec![
                SettingRow {
                    key: "credential",
                    value: config.credential.cyan().to_string(),
                },
                SettingRow {
                    key: "output_format",
                    value: config.output_format.clone(),
                },
                SettingRow {
                    key: "verbose",
                    value: config.verbose.to_string(),
                },
                SettingRow {
                    key: "timeout",
                    value: format!("{}s", config.timeout),
                },
                SettingRow {
                    key: "project",
                    value: config.project.clone().unwrap_or_else(unset),
                },
                SettingRow {
                    key: "database",
                    value: config.database.clone(),
                },
                SettingRow {
                    key: "emulator_host",
                    value: config
                        .emulator_host
                        .as_ref()
                        .map(|h| h.yellow().to_string())
                        .unwrap_or_else(unset),
                },
                SettingRow {
                    key: "max_retries",
                    value: config.max_retries.to_string(),
                },
                SettingRow {
                    key: "page_size",
                    value: config.page_size.to_string(),
                },
                SettingRow {
                    key: "pager",
                    value: config.pager.clone().unwrap_or_else(unset),
                },
            ];

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "CLI Configuration:".bold(), table))
        }
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}
