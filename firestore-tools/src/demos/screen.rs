//! `clear` and `pause` commands

use anyhow::Result;
use console::Term;

pub const PAUSE_PROMPT: &str = "Press any key to continue...";

/// Clear the whole screen. Does nothing when stdout is not a terminal.
pub fn clear(term: &Term) -> Result<()> {
    if term.is_term() {
        term.clear_screen()?;
    }
    Ok(())
}

/// Wait for a single keypress. Returns immediately when not attached to a
/// terminal. Returns whether a key was read.
pub fn pause(term: &Term) -> Result<bool> {
    if !term.is_term() {
        return Ok(false);
    }

    term.write_str(PAUSE_PROMPT)?;
    term.read_key()?;
    term.write_line("")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Under `cargo test` stdout is captured, so these take the
    // non-interactive path.
    #[test]
    fn test_pause_without_terminal() {
        let term = Term::stdout();
        if !term.is_term() {
            assert!(!pause(&term).unwrap());
        }
    }

    #[test]
    fn test_clear_without_terminal() {
        let term = Term::stdout();
        if !term.is_term() {
            clear(&term).unwrap();
        }
    }
}
