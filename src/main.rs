//! `easyconfig` (ecfg) - Hierarchical per-user/group configuration store
//!
//! Reads and writes dotted keys in a `SQLite` database: `group.key` for
//! shared settings, `user.group.key` for per-user overrides.

use easyconfig::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
