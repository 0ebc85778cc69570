//! `color` command: every foreground color, plain, bold and reversed

use colored::{Color, Colorize};
use std::io::Write;

/// The sixteen terminal colors, by name
pub const ALL_COLORS: [(&str, Color); 16] = [
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("bright_black", Color::BrightBlack),
    ("bright_red", Color::BrightRed),
    ("bright_green", Color::BrightGreen),
    ("bright_yellow", Color::BrightYellow),
    ("bright_blue", Color::BrightBlue),
    ("bright_magenta", Color::BrightMagenta),
    ("bright_cyan", Color::BrightCyan),
    ("bright_white", Color::BrightWhite),
];

/// Build the demo lines in display order.
pub fn color_lines() -> Vec<String> {
    let mut lines = Vec::with_capacity(ALL_COLORS.len() * 3 + 2);

    for (name, color) in ALL_COLORS {
        lines.push(format!("I am colored {}", name).color(color).to_string());
    }
    for (name, color) in ALL_COLORS {
        lines.push(
            format!("I am colored {} and bold", name)
                .color(color)
                .bold()
                .to_string(),
        );
    }
    for (name, color) in ALL_COLORS {
        lines.push(
            format!("I am reverse colored {}", name)
                .color(color)
                .reversed()
                .to_string(),
        );
    }

    lines.push("I am blinking".blink().to_string());
    lines.push("I am underlined".underline().to_string());
    lines
}

/// Print the color demo to `out`.
pub fn run(out: &mut impl Write) -> anyhow::Result<()> {
    for line in color_lines() {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
