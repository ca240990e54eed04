//! User-scoped lookup commands (user-group, user-key).

use easyconfig_core::BaseConfig;

use super::Context;
use crate::cli::{UserGroupArgs, UserKeyArgs};
use crate::error::Result;
use crate::format::{EntryView, format_entry_line};

fn print_entries(ctx: &Context, entries: Vec<BaseConfig>) -> Result<()> {
    if ctx.json {
        let views: Vec<EntryView> = entries.into_iter().map(EntryView::from).collect();
        ctx.print_json(&views)?;
    } else {
        for entry in &entries {
            println!("{}", format_entry_line(entry));
        }
    }
    Ok(())
}

/// Execute the user-group command.
///
/// # Errors
///
/// Returns an error if the username or group is invalid or the store cannot
/// be read.
pub fn execute_group(args: &UserGroupArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let entries = store.get_by_username_and_group(&args.username, &args.group)?;
    print_entries(ctx, entries)
}

/// Execute the user-key command.
///
/// # Errors
///
/// Returns an error if the username or key is invalid or the store cannot
/// be read.
pub fn execute_key(args: &UserKeyArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let entries = store.get_by_username_and_key(&args.username, &args.key)?;
    print_entries(ctx, entries)
}
