//! Command-line interface for `easyconfig`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{self, CliOverrides};
use crate::logging;
use commands::Context;

/// `easyconfig` (ecfg) - Hierarchical per-user/group configuration store.
#[derive(Parser, Debug)]
#[command(name = "ecfg")]
#[command(
    author,
    version,
    about = "Hierarchical per-user/group configuration store (SQLite)",
    long_about = None,
    after_help = "Keys are dotted: group.key for shared settings, user.group.key for per-user overrides."
)]
pub struct Cli {
    /// Output format: text (default) or json
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Database path (overrides config file and EASYCONFIG_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Disable the in-process query cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a workspace (.easyconfig/)
    Init(InitArgs),

    /// Print the value stored under a key
    Get(GetArgs),

    /// Store a value under a key
    Set(SetArgs),

    /// Store several values under one base key in a single commit
    SetMany(SetManyArgs),

    /// Remove a key (ignores locks)
    #[command(alias = "remove")]
    Rm(RmArgs),

    /// Show all values in a group, keyed by leaf key
    Group(GroupArgs),

    /// Show a user's entries in a group plus the group's global entries
    UserGroup(UserGroupArgs),

    /// Show the user-scoped and shared entry for a key
    UserKey(UserKeyArgs),

    /// Mark an entry as global (or clear the flag)
    Global(GlobalArgs),

    /// List entries, optionally under a prefix
    List(ListArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Recreate config files even if the workspace exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Default)]
pub struct GetArgs {
    /// Full dotted key
    pub key: String,

    /// Print the whole entry instead of just the value
    #[arg(long)]
    pub entry: bool,
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Full dotted key
    pub key: String,

    /// Value; parsed as JSON when valid, otherwise stored as a string
    pub value: String,

    /// Type tag stored with the value
    #[arg(long = "type", value_name = "TYPE")]
    pub value_type: Option<String>,

    /// Lock the entry against later writes
    #[arg(long)]
    pub locked: bool,

    /// Overwrite even if the entry is locked
    #[arg(long)]
    pub force: bool,

    /// Store the value as a string without JSON parsing
    #[arg(long)]
    pub string: bool,
}

#[derive(Args, Debug, Default)]
pub struct SetManyArgs {
    /// Base key; each pair is stored under `{base}.{key}`
    pub base: String,

    /// Pairs as key=value
    #[arg(required = true, value_name = "KEY=VALUE")]
    pub pairs: Vec<String>,

    /// Type tags as key=type (repeatable)
    #[arg(long = "type", value_name = "KEY=TYPE")]
    pub types: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct RmArgs {
    /// Full dotted key
    pub key: String,
}

#[derive(Args, Debug, Default)]
pub struct GroupArgs {
    /// Group key (e.g. `theme`)
    pub group: String,

    /// Print full entries instead of values
    #[arg(long)]
    pub entries: bool,
}

#[derive(Args, Debug, Default)]
pub struct UserGroupArgs {
    pub username: String,
    pub group: String,
}

#[derive(Args, Debug, Default)]
pub struct UserKeyArgs {
    pub username: String,
    pub key: String,
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Full dotted key
    pub key: String,

    /// Clear the global flag instead of setting it
    #[arg(long)]
    pub unset: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only entries whose id starts with this prefix
    pub prefix: Option<String>,
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.json);

    let root = std::env::current_dir().context("cannot determine working directory")?;
    let overrides = CliOverrides {
        db: cli.db.clone(),
        no_cache: cli.no_cache,
    };
    let config = config::load(&root, &overrides)?;
    let ctx = Context {
        root,
        config,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Init(args)) => commands::init::execute(&args, &ctx)?,
        Some(Commands::Get(args)) => commands::get::execute(&args, &ctx)?,
        Some(Commands::Set(args)) => commands::set::execute(&args, &ctx)?,
        Some(Commands::SetMany(args)) => commands::set::execute_many(&args, &ctx)?,
        Some(Commands::Rm(args)) => commands::remove::execute(&args, &ctx)?,
        Some(Commands::Group(args)) => commands::group::execute(&args, &ctx)?,
        Some(Commands::UserGroup(args)) => commands::user::execute_group(&args, &ctx)?,
        Some(Commands::UserKey(args)) => commands::user::execute_key(&args, &ctx)?,
        Some(Commands::Global(args)) => commands::global::execute(&args, &ctx)?,
        Some(Commands::List(args)) => commands::list::execute(&args, &ctx)?,
        Some(Commands::Version) => println!("ecfg {}", env!("CARGO_PKG_VERSION")),
        None => println!("ecfg - Hierarchical configuration store. Use --help for usage."),
    }

    Ok(())
}
