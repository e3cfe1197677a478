//! Terminal output.
//!
//! Command results go to stdout. Errors and their help text go to stderr so
//! they interleave correctly with log lines.

use owo_colors::OwoColorize;

/// Title followed by an underline of the same width.
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
    println!();
}

pub fn section(title: &str) {
    println!("{}", title.bold());
}

/// Indented `label: value` line.
pub fn field(label: &str, value: &str) {
    println!("  {}: {}", label.dimmed(), value);
}

/// `[current/total]` progress line.
pub fn progress(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

pub fn bullet(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

pub fn ok(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

pub fn note(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

pub fn caution(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

pub fn muted(text: &str) {
    println!("{}", text.dimmed());
}

pub fn blank() {
    println!();
}

/// Error line on stderr.
pub fn failure(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Help line on stderr, printed under [`failure`].
pub fn help(text: &str) {
    eprintln!("  {} {}", "help:".cyan(), text);
}

/// Styling for a script that has been applied.
pub fn applied(text: &str) -> String {
    text.green().to_string()
}

/// Styling for a script that has not been applied yet.
pub fn pending(text: &str) -> String {
    text.yellow().to_string()
}
