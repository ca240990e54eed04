//! Set and set-many command implementations.

use std::collections::BTreeMap;

use easyconfig_core::SaveOptions;

use super::{Context, parse_value, split_pair};
use crate::cli::{SetArgs, SetManyArgs};
use crate::error::Result;
use crate::format::{BatchReport, SaveReport, format_value};

/// Execute the set command.
///
/// A locked entry without `--force` is reported as skipped, not as an error.
///
/// # Errors
///
/// Returns an error if the key is invalid or the store cannot be written.
pub fn execute(args: &SetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let options = SaveOptions {
        value_type: args.value_type.clone(),
        locked: args.locked,
        force: args.force,
        flush: true,
    };
    let outcome = store.save_detailed(&args.key, parse_value(&args.value, args.string), options)?;
    let report = SaveReport::from(outcome);

    if ctx.json {
        ctx.print_json(&report)?;
    } else if report.written {
        println!("Set {} = {}", report.key, format_value(&report.entry.value));
    } else {
        println!(
            "Skipped {} (locked; use --force to overwrite)",
            report.key
        );
    }
    Ok(())
}

/// Execute the set-many command: one commit for all pairs.
///
/// # Errors
///
/// Returns an error if a pair is malformed, a key is invalid, or the store
/// cannot be written. Nothing is committed in that case.
pub fn execute_many(args: &SetManyArgs, ctx: &Context) -> Result<()> {
    let mut values = BTreeMap::new();
    for raw in &args.pairs {
        let (key, value) = split_pair(raw)?;
        values.insert(key.to_string(), parse_value(value, false));
    }
    let mut types = BTreeMap::new();
    for raw in &args.types {
        let (key, value_type) = split_pair(raw)?;
        types.insert(key.to_string(), value_type.to_string());
    }

    let store = ctx.open_store()?;
    let outcomes = store.save_multiple(&args.base, &values, &types)?;
    let report = BatchReport::from_outcomes(&args.base, outcomes);

    if ctx.json {
        ctx.print_json(&report)?;
    } else {
        println!("Saved {} key(s) under {}", report.written.len(), report.base);
        for key in &report.skipped_locked {
            println!("Skipped {key} (locked)");
        }
    }
    Ok(())
}
