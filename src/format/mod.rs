//! Output formatting for `easyconfig`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//!
//! # JSON Output Types
//!
//! - [`EntryView`] - One entry (get, list, user-group, user-key)
//! - [`SaveReport`] - Result of a single write (set)
//! - [`BatchReport`] - Result of a batch write (set-many)

mod output;
mod text;

pub use output::{BatchReport, EntryView, SaveReport};
pub use text::{format_entry_line, format_flags, format_value};
