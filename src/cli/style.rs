//! Shared terminal styling for command output

use console::{measure_text_width, pad_str, Alignment};

// ANSI color codes from design system
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const WARNING: &str = "\x1b[38;2;255;245;157m";      // #FFF59D
    pub const ERROR: &str = "\x1b[38;2;239;154;154m";        // #EF9A9A
    pub const AI_ACCENT: &str = "\x1b[38;2;255;202;40m";     // #FFCA28
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
    pub const FG: &str = "\x1b[38;2;212;212;215m";           // #D4D4D7
}

pub mod symbols {
    pub const LOADING: &str = "󰊍";
    pub const SUCCESS: &str = "󰄂";
    pub const WARNING: &str = "⚠";
    pub const ERROR: &str = "󰅚";
    pub const SEARCH: &str = "󰍉";
    pub const FILE: &str = "󰈙";
    pub const SHIELD: &str = "󰒃";
}

/// Visible width inside the box borders
const INNER_WIDTH: usize = 62;

/// Draw a rounded box with a title bar, one row per entry.
///
/// Rows may carry ANSI codes; they are padded (or cut) by visible width so
/// the right border lines up.
pub fn panel(color: &str, icon: &str, title: &str, rows: &[String]) {
    let heading = format!("─ {} {} ", icon, title);
    let fill = INNER_WIDTH.saturating_sub(measure_text_width(&heading));
    println!(
        "{}{}╭{}{}╮{}",
        color, colors::BOLD, heading, "─".repeat(fill), colors::RESET
    );
    blank_row(color);
    for row in rows {
        let cell = format!("  {}", row);
        println!(
            "{}│{}{}{}│{}",
            color,
            colors::RESET,
            pad_str(&cell, INNER_WIDTH, Alignment::Left, Some("…")),
            color,
            colors::RESET
        );
    }
    blank_row(color);
    println!("{}╰{}╯{}", color, "─".repeat(INNER_WIDTH), colors::RESET);
}

fn blank_row(color: &str) {
    println!(
        "{}│{}{}{}│{}",
        color,
        colors::RESET,
        " ".repeat(INNER_WIDTH),
        color,
        colors::RESET
    );
}

/// `label` in muted text followed by `value` in the foreground color
pub fn field(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        "{}{:<16}{} {}{}{}",
        colors::MUTED, label, colors::RESET, colors::FG, value, colors::RESET
    )
}

pub fn print_warning(message: &str) {
    println!(
        "\n{}  {} {}{}",
        colors::WARNING, symbols::WARNING, message, colors::RESET
    );
}

/// Keep the tail of long paths
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_len {
        path.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_path_keeps_tail() {
        assert_eq!(truncate_path("app/Models/User.php", 50), "app/Models/User.php");
        let long = "/home/dev/projects/shop/app/Http/Controllers/OrderController.php";
        let cut = truncate_path(long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with("OrderController.php"));
    }

    #[test]
    fn test_field_is_padded_by_visible_width() {
        let row = field("Lines:", 42);
        assert_eq!(measure_text_width(&row), 19);
    }
}
