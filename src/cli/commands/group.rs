//! Group command implementation.

use super::Context;
use crate::cli::GroupArgs;
use crate::error::Result;
use crate::format::{EntryView, format_entry_line, format_value};

/// Execute the group command.
///
/// Values mode prints `{}` for an empty group; entries mode prints `null`,
/// mirroring the two store calls.
///
/// # Errors
///
/// Returns an error if the group key is invalid or the store cannot be read.
pub fn execute(args: &GroupArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    if args.entries {
        let entries = store.load_all_by_group(&args.group)?;
        if ctx.json {
            let views = entries.map(|map| {
                map.into_iter()
                    .map(|(leaf, entry)| EntryView {
                        entry,
                        leaf: Some(leaf),
                    })
                    .collect::<Vec<_>>()
            });
            ctx.print_json(&views)?;
        } else {
            match entries {
                Some(map) => {
                    for entry in map.values() {
                        println!("{}", format_entry_line(entry));
                    }
                }
                None => println!("No entries in group {}", args.group),
            }
        }
        return Ok(());
    }

    let values = store.get_values_by_group_key(&args.group)?;
    if ctx.json {
        ctx.print_json(&values)?;
    } else {
        for (leaf, value) in &values {
            println!("{leaf} = {}", format_value(value));
        }
    }
    Ok(())
}
