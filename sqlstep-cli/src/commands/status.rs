//! `sqlstep status` command - List applied and pending scripts.

use crate::commands::open_engine;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, field};

/// Run the status command
pub async fn run(settings: &Settings) -> CliResult<()> {
    output::header("Migration Status");

    let engine = open_engine(settings).await?;
    let status = engine.status().await?;

    if status.applied.is_empty() && status.pending.is_empty() {
        output::note("No migration scripts found.");
        return Ok(());
    }

    output::section("Migrations");

    for record in &status.applied {
        let mut line = format!(
            "{} - {} at {}",
            record.filename,
            output::applied("✓ Applied"),
            record.applied_at.format("%Y-%m-%d %H:%M:%S")
        );
        if record.is_legacy() {
            line.push_str(" (no fingerprint)");
        }
        output::bullet(&line);
    }

    for filename in &status.pending {
        output::bullet(&format!(
            "{} - {}",
            filename,
            output::pending("○ Pending")
        ));
    }

    output::blank();
    field("Applied", &status.total_applied.to_string());
    field("Pending", &status.total_pending.to_string());

    if status.total_pending > 0 {
        output::blank();
        output::caution("Run `sqlstep plan` to check the pending scripts before migrating.");
    }

    Ok(())
}
