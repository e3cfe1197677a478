//! Migration script discovery.
//!
//! A migration script is a `.sql` file whose name starts with an integer id
//! followed by `_` or `-`:
//!
//! ```text
//! migrations/
//! ├── 1_create_users.sql
//! ├── 2_add_email_index.sql
//! └── 3-backfill-names.sql
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};

/// Marker that, when it opens a script body, makes the script run outside an
/// explicit transaction (e.g. `CREATE INDEX CONCURRENTLY`).
pub const NO_TRANSACTION_MARKER: &str = "-- sqlstep:no-transaction";

/// Length in bytes of a fingerprint digest before hex encoding.
const FINGERPRINT_BYTES: usize = 16;

/// A migration script read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    /// Id parsed from the filename prefix.
    pub id: i64,
    /// Filename, the key used to match history records.
    pub filename: String,
    /// Full path the script was read from.
    pub path: PathBuf,
    /// SQL body.
    pub body: String,
    /// Fingerprint over `filename` then `body`.
    pub fingerprint: String,
}

impl MigrationScript {
    /// Build a script from its filename and body, parsing the id and
    /// computing the fingerprint.
    pub fn new(filename: impl Into<String>, body: impl Into<String>) -> MigrateResult<Self> {
        let filename = filename.into();
        let body = body.into();
        let id = parse_script_id(&filename)?;
        let fingerprint = compute_fingerprint(&filename, &body);

        Ok(Self {
            id,
            path: PathBuf::from(&filename),
            filename,
            body,
            fingerprint,
        })
    }

    /// Set the path for this script.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Whether the script must run outside an explicit transaction.
    pub fn is_non_transactional(&self) -> bool {
        self.body.starts_with(NO_TRANSACTION_MARKER)
    }
}

/// Parse the id prefix of a script filename.
///
/// The prefix ends at the first `_` or `-` and must consist of ASCII digits.
pub fn parse_script_id(filename: &str) -> MigrateResult<i64> {
    let delimiter = match filename.find(['_', '-']) {
        Some(0) => {
            return Err(MigrationError::malformed(filename, "empty id before delimiter"));
        }
        Some(pos) => pos,
        None => {
            return Err(MigrationError::malformed(
                filename,
                "missing '_' or '-' delimiter",
            ));
        }
    };

    let prefix = &filename[..delimiter];
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MigrationError::malformed(
            filename,
            format!("cannot parse ID '{}'", prefix),
        ));
    }

    prefix
        .parse::<i64>()
        .map_err(|e| MigrationError::malformed(filename, format!("cannot parse ID '{}': {}", prefix, e)))
}

/// Compute the fingerprint of a script.
///
/// SHA-256 over the filename bytes followed by the body bytes, truncated to
/// 128 bits and hex encoded (32 characters).
pub fn compute_fingerprint(filename: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Reads migration scripts from a directory.
#[derive(Debug, Clone)]
pub struct ScriptLocator {
    migrations_dir: PathBuf,
}

impl ScriptLocator {
    /// Create a locator for the given directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Read every `.sql` script in the directory, in directory-listing order.
    ///
    /// Fails on the first unreadable entry or malformed filename; partial
    /// results are never returned.
    pub async fn discover(&self) -> MigrateResult<Vec<MigrationScript>> {
        let mut entries = tokio::fs::read_dir(&self.migrations_dir).await.map_err(|e| {
            MigrationError::discovery(format!(
                "cannot read directory {}: {}",
                self.migrations_dir.display(),
                e
            ))
        })?;

        let mut scripts = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            MigrationError::discovery(format!(
                "cannot list directory {}: {}",
                self.migrations_dir.display(),
                e
            ))
        })? {
            let path = entry.path();

            if !is_script_file(&path).await? {
                debug!(path = %path.display(), "Skipping non-script entry");
                continue;
            }

            scripts.push(read_script(&path).await?);
        }

        debug!(
            dir = %self.migrations_dir.display(),
            count = scripts.len(),
            "Discovered migration scripts"
        );

        Ok(scripts)
    }
}

/// Check if a path is a regular `.sql` file.
async fn is_script_file(path: &Path) -> MigrateResult<bool> {
    if path.extension().and_then(|e| e.to_str()) != Some("sql") {
        return Ok(false);
    }

    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        MigrationError::discovery(format!("cannot stat {}: {}", path.display(), e))
    })?;

    Ok(metadata.is_file())
}

/// Read and parse a single script file.
async fn read_script(path: &Path) -> MigrateResult<MigrationScript> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            MigrationError::malformed(path.display().to_string(), "filename is not valid UTF-8")
        })?;

    // Parse before reading so a bad name fails without touching the content.
    parse_script_id(filename)?;

    let body = tokio::fs::read_to_string(path).await.map_err(|e| {
        MigrationError::discovery(format!("cannot read {}: {}", path.display(), e))
    })?;

    Ok(MigrationScript::new(filename, body)?.with_path(path))
}
