//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::LogFormat;

/// sqlstep - ordered, tamper-checked SQL migrations
#[derive(Parser, Debug)]
#[command(name = "sqlstep")]
#[command(version)]
#[command(about = "sqlstep - ordered, tamper-checked SQL migrations for PostgreSQL", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to the config file (defaults to ./sqlstep.toml when present)
    #[arg(short, long, global = true, env = "SQLSTEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database connection URL
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Directory holding the migration scripts
    #[arg(short = 'd', long, global = true, env = "SQLSTEP_MIGRATIONS_DIR")]
    pub migrations_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace, off); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every pending migration script
    Migrate,

    /// Show what `migrate` would do without changing anything
    Plan,

    /// List applied and pending migration scripts
    Status,

    /// Display version information
    Version,
}
