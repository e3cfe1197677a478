//! CLI error types and result alias.

use miette::Diagnostic;
use sqlstep_migrate::MigrationError;
use sqlstep_postgres::PgError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(sqlstep::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(sqlstep::config))]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(
        code(sqlstep::database),
        help("Check the database URL and that the server is reachable")
    )]
    Database(String),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(sqlstep::migration))]
    Migration(String),

    /// Applied history and scripts on disk disagree
    #[error("Integrity error: {0}")]
    #[diagnostic(
        code(sqlstep::integrity),
        help(
            "Applied scripts must stay as they were applied. Restore the original file and put new changes in a new script"
        )
    )]
    Integrity(String),
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        if err.is_integrity_violation() {
            CliError::Integrity(err.to_string())
        } else {
            CliError::Migration(err.to_string())
        }
    }
}

impl From<PgError> for CliError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
