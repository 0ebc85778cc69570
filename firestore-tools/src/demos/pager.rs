//! `pager` command: long output shown through a pager

use anyhow::{Context, Result};
use colored::Colorize;
use console::Term;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

const DEFAULT_PAGER: &str = "less -R";
const LINE_COUNT: usize = 200;

/// The text paged by the demo.
pub fn pager_text() -> String {
    (0..LINE_COUNT)
        .map(|n| format!("{}. Hello World!", n.to_string().green()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pick the pager command: `$PAGER`, then the configured one, then `less -R`.
pub fn pager_command(configured: Option<&str>) -> String {
    std::env::var("PAGER")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_PAGER.to_string())
}

/// Feed `text` to the pager's stdin and wait for it to exit.
fn page_through(command: &str, text: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty pager command"))?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start pager '{}'", command))?;

    if let Some(mut stdin) = child.stdin.take() {
        // The pager may quit before reading everything
        if let Err(e) = writeln!(stdin, "{}", text) {
            debug!(error = %e, "Pager closed its input early");
        }
    }

    child.wait().context("Failed to wait for pager")?;
    Ok(())
}

/// Show the demo text through a pager, or print it when stdout is not a
/// terminal or no pager can be started.
pub fn run(configured_pager: Option<&str>) -> Result<()> {
    let text = pager_text();

    if Term::stdout().is_term() {
        let command = pager_command(configured_pager);
        match page_through(&command, &text) {
            Ok(()) => return Ok(()),
            Err(e) => warn!(error = %e, "Falling back to direct output"),
        }
    }

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_pager_text() {
        colored::control::set_override(false);
        let text = pager_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 200);
        assert_eq!(lines[0], "0. Hello World!");
        assert_eq!(lines[199], "199. Hello World!");
    }

    #[test]
    #[serial]
    fn test_pager_command_priority() {
        std::env::remove_var("PAGER");
        assert_eq!(pager_command(None), "less -R");
        assert_eq!(pager_command(Some("more")), "more");

        std::env::set_var("PAGER", "most");
        assert_eq!(pager_command(Some("more")), "most");
        std::env::remove_var("PAGER");
    }

    #[test]
    fn test_page_through_missing_program() {
        let err = page_through("definitely-not-a-pager-binary", "text").unwrap_err();
        assert!(err.to_string().contains("Failed to start pager"));
    }
}
