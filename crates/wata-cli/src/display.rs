//! Display utilities for the CLI

use colored::*;
use serde::Serialize;

use wata_types::{ErrorResponse, WataError};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Print a value as pretty JSON on stdout
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a service error as its `{code, message}` body on stderr
pub fn failure(err: &WataError) {
    let body = ErrorResponse::from(err);
    eprintln!(
        "  {} [{}] {}",
        "✗".bright_red(),
        body.code.bright_yellow(),
        body.message.bright_red()
    );
}
