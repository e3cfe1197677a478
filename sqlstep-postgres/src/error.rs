//! Error types for PostgreSQL operations.

use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors raised inside the PostgreSQL gateway.
///
/// They do not cross the [`sqlstep_migrate::PersistenceGateway`] boundary;
/// [`crate::PgGateway`] turns them into failure outcomes carrying
/// [`PgError::describe`].
#[derive(Error, Debug)]
pub enum PgError {
    /// No connection could be checked out.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The server or the protocol layer reported an error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Connection settings are invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A statement failed and the rollback that followed failed too.
    #[error("{error}; rollback failed: {rollback}")]
    Rollback {
        error: Box<PgError>,
        rollback: Box<PgError>,
    },

    /// A result column has a type rows cannot carry.
    #[error("unsupported type {type_name} for column '{column}'")]
    UnsupportedType { column: String, type_name: String },

    /// A result column could not be decoded.
    #[error("cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the database could not be reached at all, as opposed to
    /// rejecting a statement.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Postgres(e) => e.is_closed() || (e.as_db_error().is_none() && e.code().is_none()),
            Self::Rollback { error, .. } => error.is_connection_error(),
            _ => false,
        }
    }

    /// SQLSTATE code reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|c| c.code()),
            Self::Rollback { error, .. } => error.sql_state(),
            _ => None,
        }
    }

    /// Message for a gateway failure outcome.
    ///
    /// Server errors read `severity: message (SQLSTATE code)` followed by
    /// the detail and hint when the server sent them.
    pub fn describe(&self) -> String {
        let db = match self {
            Self::Postgres(e) => e.as_db_error(),
            _ => None,
        };
        let Some(db) = db else {
            return self.to_string();
        };

        let mut message = format!(
            "{}: {} (SQLSTATE {})",
            db.severity(),
            db.message(),
            db.code().code()
        );
        for (label, value) in [("detail", db.detail()), ("hint", db.hint())] {
            if let Some(value) = value {
                message.push_str(&format!("; {}: {}", label, value));
            }
        }
        message
    }
}
