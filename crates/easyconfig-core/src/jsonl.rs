//! JSONL file I/O for configuration tables.
//!
//! Each line is one complete entry.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};

/// Load entries from a JSONL file. Blank lines are skipped.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, or `JsonlParse` if any line is invalid.
pub fn load<E: DeserializeOwned>(path: &Path) -> Result<Vec<E>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry = serde_json::from_str(trimmed).map_err(|e| ConfigError::JsonlParse {
            line: line_num + 1,
            reason: e.to_string(),
        })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Save entries to a JSONL file with atomic write (temp file + rename).
///
/// # Errors
///
/// Returns `Io` if the file cannot be written, or `Json` if an entry fails
/// to serialize.
pub fn save<'a, E, I>(path: &Path, entries: I) -> Result<()>
where
    E: Serialize + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let tmp_path = path.with_extension("jsonl.tmp");
    let mut file = fs::File::create(&tmp_path)?;

    for entry in entries {
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;
    }

    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, path)?;

    Ok(())
}
