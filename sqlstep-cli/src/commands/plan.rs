//! `sqlstep plan` command - Show pending work without applying it.

use crate::commands::open_engine;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, ok};

/// Run the plan command
pub async fn run(settings: &Settings) -> CliResult<()> {
    output::header("Migration Plan");

    let engine = open_engine(settings).await?;
    let plan = engine.plan().await?;

    if plan.is_empty() {
        ok(&format!(
            "Nothing to apply ({} up to date)",
            plan.up_to_date
        ));
        return Ok(());
    }

    if !plan.pending.is_empty() {
        output::section("Pending");
        for script in &plan.pending {
            let mode = if script.is_non_transactional() {
                " (no transaction)"
            } else {
                ""
            };
            output::bullet(&format!("{}{}", script.filename, mode));
        }
        output::blank();
    }

    if !plan.backfills.is_empty() {
        output::section("Fingerprint backfill");
        for script in &plan.backfills {
            output::bullet(&script.filename);
        }
        output::blank();
    }

    output::note(&plan.summary());
    output::muted("Run `sqlstep migrate` to apply.");

    Ok(())
}
