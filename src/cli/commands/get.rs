//! Get command implementation.

use super::Context;
use crate::cli::GetArgs;
use crate::error::Result;
use crate::format::{EntryView, format_entry_line, format_value};

/// Execute the get command. A missing key prints nothing (`null` in JSON).
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn execute(args: &GetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    if args.entry {
        let entry = store.get(&args.key)?;
        if ctx.json {
            ctx.print_json(&entry.map(EntryView::from))?;
        } else if let Some(entry) = entry {
            println!("{}", format_entry_line(&entry));
        }
        return Ok(());
    }

    let value = store.get_configuration_value(&args.key)?;
    if ctx.json {
        ctx.print_json(&value)?;
    } else if let Some(value) = value {
        println!("{}", format_value(&value));
    }
    Ok(())
}
