//! List command implementation.

use easyconfig_core::EntityTable;

use super::Context;
use crate::cli::ListArgs;
use crate::error::Result;
use crate::format::{EntryView, format_entry_line};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn execute(args: &ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let entries = match &args.prefix {
        Some(prefix) => store.table().find_by_prefix(prefix)?,
        None => store.table().all()?,
    };

    if ctx.json {
        let views: Vec<EntryView> = entries.into_iter().map(EntryView::from).collect();
        ctx.print_json(&views)?;
    } else if entries.is_empty() {
        println!("No entries");
    } else {
        for entry in &entries {
            println!("{}", format_entry_line(entry));
        }
    }
    Ok(())
}
