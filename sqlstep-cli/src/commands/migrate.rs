//! `sqlstep migrate` command - Apply pending migration scripts.

use crate::commands::open_engine;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, ok};

/// Run the migrate command
pub async fn run(settings: &Settings) -> CliResult<()> {
    output::header("Migrate");

    let engine = open_engine(settings).await?;

    output::progress(1, 2, "Checking migration history...");
    let plan = engine.plan().await?;

    if plan.is_empty() {
        output::blank();
        ok("Database is up to date");
        return Ok(());
    }

    for script in &plan.pending {
        output::bullet(&format!(
            "{} {}",
            script.filename,
            output::pending("(pending)")
        ));
    }
    for script in &plan.backfills {
        output::bullet(&format!("{} (fingerprint backfill)", script.filename));
    }
    output::blank();

    output::progress(2, 2, "Applying migrations...");
    let report = engine.run().await?;

    for filename in &report.applied {
        output::bullet(&output::applied(&format!("✓ {}", filename)));
    }

    output::blank();
    ok(&report.summary());

    Ok(())
}
