// Output formatting utilities

use crate::models::{ListView, Row};
use crate::strings::{Message, Strings};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Narrowest the description column is allowed to shrink to
const MIN_DESCRIPTION_WIDTH: usize = 10;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Clear the terminal before redrawing the interactive screen
pub fn clear_screen() {
    if is_tty() {
        print!("{}", ANSI_CLEAR_SCREEN);
    }
}

/// Split `text` into lines of at most `width` characters
///
/// Breaks at the last space that fits; words longer than the column are cut.
fn wrap_cell(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > width {
        let split = rest[..=width]
            .iter()
            .rposition(|c| *c == ' ')
            .filter(|pos| *pos > 0)
            .unwrap_or(width);
        let line: String = rest[..split].iter().collect();
        lines.push(line.trim_end().to_string());
        let skip = if rest.get(split) == Some(&' ') { split + 1 } else { split };
        rest = rest[skip..].to_vec();
    }

    lines.push(rest.into_iter().collect());
    lines
}

/// Lay out cells in fixed-width, left-justified columns
///
/// Each column takes `widths[i]` characters plus `padding` spaces. A cell
/// longer than its column wraps onto continuation lines; the other columns
/// are blank on those lines. Trailing spaces are trimmed.
pub fn columnize(cells: &[&str], widths: &[usize], padding: usize) -> Vec<String> {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap_cell(cell, *width))
        .collect();
    let height = wrapped.iter().map(|lines| lines.len()).max().unwrap_or(1);

    (0..height)
        .map(|line_no| {
            let mut line = String::new();
            for (lines, width) in wrapped.iter().zip(widths) {
                let text = lines.get(line_no).map(String::as_str).unwrap_or("");
                let fill = width + padding - text.chars().count().min(*width);
                line.push_str(text);
                line.push_str(&" ".repeat(fill));
            }
            line.trim_end().to_string()
        })
        .collect()
}

/// Shrink the description column so the table fits `terminal_width`
pub fn fit_widths(widths: [usize; 5], padding: usize, terminal_width: usize) -> [usize; 5] {
    let total: usize = widths.iter().map(|w| w + padding).sum::<usize>() - padding;
    let mut fitted = widths;
    if total > terminal_width {
        let excess = total - terminal_width;
        let floor = MIN_DESCRIPTION_WIDTH.min(widths[1]);
        fitted[1] = widths[1].saturating_sub(excess).max(floor);
    }
    fitted
}

fn table_width(widths: &[usize; 5], padding: usize) -> usize {
    widths.iter().map(|w| w + padding).sum::<usize>() - padding
}

/// Render one screen: header, open path, separator and the visible rows
pub fn render_table(
    view: &ListView,
    strings: &Strings,
    widths: [usize; 5],
    padding: usize,
    is_tty: bool,
) -> String {
    let header = [
        strings.get(Message::HeaderId),
        strings.get(Message::HeaderDescription),
        strings.get(Message::HeaderDoDate),
        strings.get(Message::HeaderDueDate),
        strings.get(Message::HeaderRecurrence),
    ];
    let separator = "-".repeat(table_width(&widths, padding));

    let mut out = String::new();
    for line in columnize(&header, &widths, padding) {
        out.push_str(&bold_if_tty(&line, is_tty));
        out.push('\n');
    }
    out.push_str(&separator);
    out.push('\n');

    if !view.breadcrumbs.is_empty() {
        push_rows(&mut out, &view.breadcrumbs, &widths, padding);
        out.push_str(&separator);
        out.push('\n');
    }

    push_rows(&mut out, &view.rows, &widths, padding);
    out
}

fn push_rows(out: &mut String, rows: &[Row], widths: &[usize; 5], padding: usize) {
    for row in rows {
        for line in columnize(&row.cells(), widths, padding) {
            out.push_str(&line);
            out.push('\n');
        }
    }
}
