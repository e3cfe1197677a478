//! `sqlstep version` command.

use sqlstep_migrate::{MIGRATIONS_TABLE, NO_TRANSACTION_MARKER};

use crate::config::CONFIG_FILE_NAME;
use crate::error::CliResult;
use crate::output::{self, field};

/// Print version and build details. Needs neither a config file nor a database.
pub async fn run() -> CliResult<()> {
    output::header("sqlstep");

    field("Version", env!("CARGO_PKG_VERSION"));
    field(
        "Profile",
        if cfg!(debug_assertions) { "debug" } else { "release" },
    );
    field("Backend", "PostgreSQL");
    output::blank();

    output::section("Conventions");
    field("Config file", CONFIG_FILE_NAME);
    field("Tracking table", MIGRATIONS_TABLE);
    field("No-transaction marker", NO_TRANSACTION_MARKER);

    Ok(())
}
