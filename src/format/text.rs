//! Text formatting functions for `easyconfig`.
//!
//! Provides plain text (non-ANSI) formatting for terminal output:
//! - Flag markers (🔒 locked, 🌐 global)
//! - Value rendering (strings bare, everything else as compact JSON)
//! - Entry line formatting

use easyconfig_core::{BaseConfig, ConfigValue};

/// Flag marker characters.
pub mod icons {
    /// Locked - writes need --force.
    pub const LOCKED: &str = "🔒";
    /// Global - fallback for every user.
    pub const GLOBAL: &str = "🌐";
}

/// Render a value: strings without quotes, everything else as compact JSON.
#[must_use]
pub fn format_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flag markers for an entry, space separated; empty when none apply.
#[must_use]
pub fn format_flags(entry: &BaseConfig) -> String {
    let mut flags = Vec::new();
    if entry.locked {
        flags.push(icons::LOCKED);
    }
    if entry.is_global {
        flags.push(icons::GLOBAL);
    }
    flags.join(" ")
}

/// Format a single-line entry summary.
///
/// Format: `{id} = {value} [{type}] {flags}`
#[must_use]
pub fn format_entry_line(entry: &BaseConfig) -> String {
    let mut line = format!("{} = {}", entry.id, format_value(&entry.value));
    if let Some(value_type) = &entry.value_type {
        line.push_str(&format!(" [{value_type}]"));
    }
    let flags = format_flags(entry);
    if !flags.is_empty() {
        line.push(' ');
        line.push_str(&flags);
    }
    line
}
