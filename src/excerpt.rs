//! Code excerpts shown under `code:` in the report.

/// ANSI escape codes, only emitted when color is on.
pub(crate) mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const GRAY: &str = "\x1b[90m";

    pub fn paint(text: &str, color: &str, enabled: bool) -> String {
        if enabled {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// Width of the pointer window, in characters.
pub const POINTER_WIDTH: usize = 80;

/// Columns taken by the `  code:    ` label the excerpt is printed after.
pub const LABEL_INDENT: usize = 11;

/// Lines shown on each side of the highlighted frame line.
pub const FRAME_CONTEXT: usize = 3;

/// One line of `code` around `offset`, with a caret under the offending
/// character. The window is centred on the offset and clamped to the start of
/// the offending line, not the start of `code`. It never spans a line break.
pub fn code_pointer(code: &str, offset: usize, color: bool) -> String {
    let offset = crate::diagnostic::floor_char_boundary(code, offset);
    let line_start = code[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = code[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(code.len());
    let line = code[line_start..line_end].trim_end_matches('\r');

    let pos = code[line_start..offset].chars().count();
    let start = pos.saturating_sub(POINTER_WIDTH / 2);
    let window: String = line.chars().skip(start).take(POINTER_WIDTH).collect();
    let arrow_pos = pos - start;

    let arrow = format!("{}^", " ".repeat(arrow_pos + LABEL_INDENT - 1));
    format!("{}\n{}", window, colors::paint(&arrow, colors::YELLOW, color))
}

/// Numbered listing of `lines` around the 0-based `highlight` index.
pub fn code_frame(lines: &[&str], highlight: usize, color: bool) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let highlight = highlight.min(lines.len() - 1);
    let start = highlight.saturating_sub(FRAME_CONTEXT);
    let end = (highlight + FRAME_CONTEXT + 1).min(lines.len());

    let mut out = Vec::with_capacity(end - start);
    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        if i == highlight {
            let number = format!("> {}", i + 1);
            let text = format!("{:>6} | {}", number, line);
            out.push(colors::paint(&text, colors::YELLOW, color));
        } else {
            let number = format!(" {}", i + 1);
            let text = format!("{:>6} | {}", number, line);
            out.push(colors::paint(&text, colors::GRAY, color));
        }
    }

    format!("\n{}", out.join("\n"))
}

/// Split embedded source text the way editors number it.
pub fn split_lines(source: &str) -> Vec<&str> {
    source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}
