//! Terminal output for certfix commands.
//!
//! Status lines go to stdout and errors to stderr. API responses are printed
//! as indented JSON so they can be piped into other tools.

use colored::Colorize;
use serde_json::Value;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a command title, underlined
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print `key: value` lines with the values lined up
pub fn fields<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) {
    let width = label_width(pairs.iter().map(|(k, _)| k.as_ref()));
    for (key, value) in pairs {
        let label = format!("{:<width$}", format!("{}:", key.as_ref()));
        println!("  {} {}", label.dimmed(), value.as_ref());
    }
}

/// Print an item progress line such as `[ 3/12] billing`
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", counter(num, total).blue().bold(), msg);
}

/// Print a resource a dry run would create
pub fn planned(label: &str) {
    println!("  {} {}", "+".green(), label.bold());
}

/// Print a resource deleted during rollback
pub fn removed(label: &str) {
    println!("  {} {}", "-".red(), label.dimmed());
}

/// Print a decoded API response
pub fn json(value: &Value) {
    println!("{}", render_json(value));
}

fn counter(num: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{num:>width$}/{total}]")
}

/// Width of the longest `key:` label
fn label_width<'a>(keys: impl Iterator<Item = &'a str>) -> usize {
    keys.map(|k| k.chars().count() + 1).max().unwrap_or(0)
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
