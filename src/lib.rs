//! # sqlstep
//!
//! Ordered, tamper-checked SQL migration scripts for PostgreSQL.
//!
//! sqlstep provides:
//! - Discovery of `<id>_<name>.sql` scripts with a contiguous id sequence
//! - A tracking table that records each applied script with a fingerprint
//! - Refusal to run when an applied script was edited or removed
//! - Per-script transactions, with an opt-out marker for statements such as
//!   `CREATE INDEX CONCURRENTLY`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sqlstep::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = PgGateway::connect("postgresql://localhost/mydb").await?;
//!     let config = ReconcilerConfig::new().migrations_dir("./migrations");
//!
//!     let mut engine = Reconciler::new(config, gateway);
//!     if !engine.init().await {
//!         return Err("tracking table bootstrap failed".into());
//!     }
//!
//!     let report = engine.run().await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `postgres` (default): the PostgreSQL gateway from `sqlstep-postgres`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Script discovery, reconciliation and the migration engine.
pub mod migrate {
    pub use sqlstep_migrate::*;
}

/// PostgreSQL persistence gateway.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use sqlstep_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        MigrateResult, MigrationError, PersistenceGateway, Reconciler, ReconcilerConfig,
        RunReport,
    };

    #[cfg(feature = "postgres")]
    pub use crate::postgres::{PgGateway, PgPool};
}

// Re-export key types at the crate root
pub use migrate::{MigrateResult, MigrationError, Reconciler, ReconcilerConfig};
