//! Output formatting helpers for the `cover` CLI.
//!
//! JSON output, simple aligned tables, and colored true/false rendering that
//! honours `NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE` and TTY detection.

use std::env;
use std::io::{self, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

// Ayu Dark palette
const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray

pub const ICON_PASS: &str = "\u{2713}";
pub const ICON_FAIL: &str = "\u{2716}";

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// The last column is never padded, so it is the only one that may carry
/// color escape codes.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle, "{}", format_row(headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(handle, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(handle, "{}", format_row(row, &widths));
    }
}

fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        match widths.get(i) {
            // Last column is not padded.
            Some(&w) if i + 1 < cells.len() => {
                line.push_str(&format!("{:<width$}", cell.as_ref(), width = w));
            }
            _ => line.push_str(cell.as_ref()),
        }
    }
    line
}

/// Render a coverage flag as `✓ yes` / `✖ no`, colored when supported.
pub fn render_flag(value: bool) -> String {
    if value {
        color_str(&format!("{} yes", ICON_PASS), PASS)
    } else {
        color_str(&format!("{} no", ICON_FAIL), FAIL)
    }
}

/// Renders text with muted (gray) styling.
pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

/// Renders text in bold.
pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

/// Returns `true` if stdout is connected to a terminal.
fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&io::stdout())
}

/// Determines if ANSI color codes should be used.
///
/// `NO_COLOR` (any value), `CLICOLOR=0` and `TERM=dumb` disable color;
/// `CLICOLOR_FORCE` forces it; otherwise color follows TTY detection.
pub fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").as_deref() == Ok("0") {
        return false;
    }
    if env::var("TERM").as_deref() == Ok("dumb") {
        return false;
    }
    if env::var_os("CLICOLOR_FORCE").is_some() {
        return true;
    }
    is_tty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned() {
        let widths = [5, 3];
        assert_eq!(format_row(&["ab", "c"], &widths), "ab     c");
        assert_eq!(format_row(&["abcde", "xyz"], &widths), "abcde  xyz");
    }

    #[test]
    fn last_column_is_not_padded() {
        assert_eq!(format_row(&["a", "b"], &[1, 10]), "a  b");
    }

    #[test]
    fn flag_text_contains_word() {
        assert!(render_flag(true).contains("yes"));
        assert!(render_flag(false).contains("no"));
    }
}
