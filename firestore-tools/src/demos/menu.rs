//! `menu` command: a two-level single-keystroke menu

use anyhow::Result;
use console::Term;
use std::io::Write;

/// Which menu is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Main,
    Debug,
    Quit,
}

impl MenuState {
    /// Lines printed when entering this state.
    pub fn prompt(&self) -> &'static [&'static str] {
        match self {
            MenuState::Main => &["Main menu:", "  d: debug menu", "  q: quit"],
            MenuState::Debug => &["Debug menu", "  b: back"],
            MenuState::Quit => &[],
        }
    }

    /// Next state after `key`, with the message to print if the key is not
    /// accepted here.
    pub fn step(self, key: char) -> (MenuState, Option<&'static str>) {
        match (self, key) {
            (MenuState::Main, 'd') => (MenuState::Debug, None),
            (MenuState::Main, 'q') => (MenuState::Quit, None),
            (MenuState::Debug, 'b') => (MenuState::Main, None),
            (MenuState::Quit, _) => (MenuState::Quit, None),
            (state, _) => (state, Some("Invalid input")),
        }
    }
}

/// Drive the menu from a key source until it reaches `Quit` or the source
/// runs dry. Returns the final state.
pub fn run_with<K, W>(mut next_key: K, out: &mut W) -> Result<MenuState>
where
    K: FnMut() -> Result<Option<char>>,
    W: Write,
{
    let mut state = MenuState::Main;

    while state != MenuState::Quit {
        for line in state.prompt() {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;

        let Some(key) = next_key()? else {
            break;
        };
        let (next, message) = state.step(key);
        if let Some(message) = message {
            writeln!(out, "{}", message)?;
        }
        state = next;
    }

    Ok(state)
}

/// Run the menu against the terminal, one keystroke at a time.
pub fn run(term: &Term) -> Result<()> {
    let mut out = std::io::stdout();
    if term.is_term() {
        run_with(|| Ok(Some(term.read_char()?)), &mut out)?;
    } else {
        // Without a terminal, keys come from stdin lines
        let mut keys = std::io::read_to_string(std::io::stdin())?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<Vec<_>>()
            .into_iter();
        run_with(|| Ok(keys.next()), &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(MenuState::Main.step('d'), (MenuState::Debug, None));
        assert_eq!(MenuState::Main.step('q'), (MenuState::Quit, None));
        assert_eq!(
            MenuState::Main.step('x'),
            (MenuState::Main, Some("Invalid input"))
        );
        assert_eq!(MenuState::Debug.step('b'), (MenuState::Main, None));
        assert_eq!(
            MenuState::Debug.step('q'),
            (MenuState::Debug, Some("Invalid input"))
        );
        assert_eq!(MenuState::Quit.step('d'), (MenuState::Quit, None));
    }

    #[test]
    fn test_run_with_scripted_keys() {
        let mut keys = "xdzbq".chars();
        let mut out = Vec::new();

        let state = run_with(|| Ok(keys.next()), &mut out).unwrap();
        assert_eq!(state, MenuState::Quit);

        let output = String::from_utf8(out).unwrap();
        assert_eq!(output.matches("Main menu:").count(), 3);
        assert_eq!(output.matches("Debug menu").count(), 2);
        assert_eq!(output.matches("Invalid input").count(), 2);
    }

    #[test]
    fn test_run_with_exhausted_keys() {
        let mut keys = "d".chars();
        let mut out = Vec::new();
        let state = run_with(|| Ok(keys.next()), &mut out).unwrap();
        assert_eq!(state, MenuState::Debug);
    }
}
