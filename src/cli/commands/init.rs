//! Init command implementation.

use std::fs;

use easyconfig_core::BaseConfig;
use tracing::info;

use super::Context;
use crate::cli::InitArgs;
use crate::config::{self, CONFIG_DIR, CONFIG_FILE};
use crate::error::{EasyConfigError, Result};
use crate::storage::SqliteTable;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created.
pub fn execute(args: &InitArgs, ctx: &Context) -> Result<()> {
    let dir = ctx.root.join(CONFIG_DIR);
    let db_path = &ctx.config.database;

    if db_path.exists() && !args.force {
        return Err(EasyConfigError::AlreadyInitialized {
            path: db_path.clone(),
        });
    }
    fs::create_dir_all(&dir)?;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema.
    let _table: SqliteTable<BaseConfig> = SqliteTable::open(db_path)?;

    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() || args.force {
        fs::write(&config_path, config::starter_yaml()?)?;
    }

    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(gitignore_path, "*.db\n*.db-wal\n*.db-shm\n")?;
    }

    info!(path = %db_path.display(), "workspace initialized");
    if ctx.json {
        ctx.print_json(&serde_json::json!({ "database": db_path }))?;
    } else {
        println!("Initialized {}", db_path.display());
    }
    Ok(())
}
