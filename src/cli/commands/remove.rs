//! Remove command implementation.

use super::Context;
use crate::cli::RmArgs;
use crate::error::Result;

/// Execute the rm command. Removing a missing key succeeds.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written.
pub fn execute(args: &RmArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let existed = store.get(&args.key)?.is_some();
    store.remove_by_key(&args.key)?;

    if ctx.json {
        ctx.print_json(&serde_json::json!({ "key": args.key, "removed": existed }))?;
    } else if existed {
        println!("Removed {}", args.key);
    } else {
        println!("{} was not set", args.key);
    }
    Ok(())
}
