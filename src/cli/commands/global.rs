//! Global command implementation.

use super::Context;
use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::format::{EntryView, format_entry_line};

/// Execute the global command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written.
pub fn execute(args: &GlobalArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let updated = store.set_global(&args.key, !args.unset)?;

    if ctx.json {
        ctx.print_json(&updated.map(EntryView::from))?;
    } else {
        match updated {
            Some(entry) => println!("{}", format_entry_line(&entry)),
            None => println!("{} is not set", args.key),
        }
    }
    Ok(())
}
