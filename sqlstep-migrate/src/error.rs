//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while discovering, validating, or applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A script filename does not follow `<id><_|-><rest>.sql`.
    #[error("Malformed migration filename '{filename}': {reason}")]
    MalformedFilename {
        /// Offending filename.
        filename: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The migrations directory or one of its files could not be read.
    #[error("Migration discovery failed: {0}")]
    DiscoveryFailed(String),

    /// A migration operation was attempted before the tracking table was bootstrapped.
    #[error("Migration engine is not initialized; the tracking table bootstrap did not succeed")]
    NotInitialized,

    /// A script id breaks the contiguous id sequence.
    #[error("Sequence gap at migration '{filename}': expected id {expected}, found {found}")]
    SequenceGap {
        /// Script whose id is out of sequence.
        filename: String,
        /// The id that should have been next.
        expected: i64,
        /// The id the script actually carries.
        found: i64,
    },

    /// An already-applied script was edited on disk.
    #[error(
        "Migration '{filename}' has been modified after being applied: stored fingerprint {stored}, current {current}"
    )]
    ImmutableScriptModified {
        /// Script filename.
        filename: String,
        /// Fingerprint recorded when the script was applied.
        stored: String,
        /// Fingerprint of the script as it is on disk now.
        current: String,
    },

    /// The database rejected a script body.
    #[error("Migration '{filename}' failed to execute: {message}")]
    ScriptExecutionFailed {
        /// Script filename.
        filename: String,
        /// Message reported by the gateway.
        message: String,
    },

    /// Reading or writing the tracking table failed.
    #[error("Migration history error: {0}")]
    PersistenceFailure(String),
}

impl MigrationError {
    /// Create a malformed filename error.
    pub fn malformed(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilename {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Create a discovery error.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::DiscoveryFailed(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    /// Create a script execution error.
    pub fn execution(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptExecutionFailed {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Check whether this error means the script history on disk or in the
    /// database can no longer be trusted.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::SequenceGap { .. } | Self::ImmutableScriptModified { .. }
        )
    }
}
