//! CLI command implementations.

pub mod migrate;
pub mod plan;
pub mod status;
pub mod version;

use sqlstep_migrate::{Reconciler, ReconcilerConfig};
use sqlstep_postgres::{PgConfig, PgGateway, PgPool};
use tracing::debug;

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output;

/// Connect to the database and bootstrap the tracking table.
pub(crate) async fn open_engine(settings: &Settings) -> CliResult<Reconciler<PgGateway>> {
    let url = settings.require_database_url()?;
    let config = PgConfig::from_url(url)?;

    output::field("Database", &config.display_target());
    output::field("Migrations", &settings.migrations_dir.display().to_string());
    output::blank();

    debug!(
        database = %config.display_target(),
        migrations_dir = %settings.migrations_dir.display(),
        "Opening migration engine"
    );
    let pool = PgPool::builder().config(config).build().await?;
    let engine_config = ReconcilerConfig::new().migrations_dir(settings.migrations_dir.clone());
    let mut engine = Reconciler::new(engine_config, PgGateway::new(pool));

    if !engine.init().await {
        return Err(CliError::Database(
            "could not initialize the migrations table".to_string(),
        ));
    }

    Ok(engine)
}
