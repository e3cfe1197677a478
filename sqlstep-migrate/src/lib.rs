//! # sqlstep-migrate
//!
//! Migration reconciliation engine for sqlstep.
//!
//! This crate provides functionality for:
//! - Discovering numbered `.sql` scripts in a directory
//! - Fingerprinting scripts so edits after application are caught
//! - Validating that script ids form a contiguous sequence
//! - Tracking applied scripts in a `migrations` table
//! - Applying missing scripts in order, each in its own transaction
//!
//! ## Architecture
//!
//! The engine reads scripts through the [`ScriptLocator`] and talks to the
//! database only through a [`PersistenceGateway`]. The `sqlstep-postgres`
//! crate provides the PostgreSQL gateway.
//!
//! ```text
//! ┌───────────────┐     ┌────────────────┐     ┌────────────────────┐
//! │ ScriptLocator │────▶│   Reconciler   │────▶│ PersistenceGateway │
//! └───────────────┘     └────────────────┘     └────────────────────┘
//!                               │                        │
//!                               ▼                        ▼
//!                       ┌────────────────┐     ┌────────────────────┐
//!                       │ MigrationPlan  │     │  migrations table  │
//!                       └────────────────┘     └────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlstep_migrate::{Reconciler, ReconcilerConfig};
//!
//! async fn run_migrations(gateway: impl PersistenceGateway) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReconcilerConfig::new().migrations_dir("./migrations");
//!     let mut engine = Reconciler::new(config, gateway);
//!
//!     // Creates the migrations table on first use
//!     if !engine.init().await {
//!         return Err("tracking table bootstrap failed".into());
//!     }
//!
//!     let report = engine.run().await?;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! Scripts are flat files named `<id>_<name>.sql` or `<id>-<name>.sql`. Ids
//! must be contiguous. A script whose body starts with
//! [`NO_TRANSACTION_MARKER`] runs outside a transaction:
//!
//! ```text
//! migrations/
//! ├── 1_create_users.sql
//! ├── 2_add_email.sql
//! └── 3_email_index.sql      # -- sqlstep:no-transaction
//! ```

pub mod engine;
pub mod error;
pub mod file;
pub mod gateway;
pub mod history;

#[cfg(test)]
mod testing;

// Re-exports
pub use engine::{
    MigrationPlan, MigrationStatus, Reconciler, ReconcilerConfig, RunReport, reconcile,
    validate_sequence,
};
pub use error::{MigrateResult, MigrationError};
pub use file::{
    MigrationScript, NO_TRANSACTION_MARKER, ScriptLocator, compute_fingerprint, parse_script_id,
};
pub use gateway::{ExecOutcome, PersistenceGateway, Row, SqlValue, Statement};
pub use history::{MIGRATIONS_TABLE, MigrationRecord};
