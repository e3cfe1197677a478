//! Migration history tracking.
//!
//! Applied scripts are recorded in the `migrations` table. Row `id = 0` is a
//! sentinel written when the table is created; real records carry the id of
//! the script they record.

use chrono::NaiveDateTime;

use crate::error::MigrateResult;
use crate::file::MigrationScript;
use crate::gateway::{Row, Statement};

/// Name of the tracking table.
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Id reserved for the bootstrap sentinel row.
pub const SENTINEL_ID: i64 = 0;

/// Filename stored on the sentinel row.
pub const SENTINEL_FILENAME: &str = "__sqlstep_tracking_table_created__";

/// SQL for checking whether the tracking table exists (PostgreSQL).
pub const TABLE_EXISTS_SQL: &str =
    "SELECT to_regclass('migrations') IS NOT NULL AS table_exists";

/// SQL for creating the tracking table (PostgreSQL).
pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE migrations (
    id          BIGSERIAL    PRIMARY KEY,
    filename    VARCHAR(255) NOT NULL UNIQUE,
    timestamp   TIMESTAMP    NOT NULL DEFAULT now(),
    fingerprint VARCHAR(32)
)
"#;

/// SQL for writing the sentinel row.
pub const INSERT_SENTINEL_SQL: &str =
    "INSERT INTO migrations (id, filename, fingerprint) VALUES ($1, $2, NULL)";

/// SQL for loading every record, sentinel included.
pub const SELECT_RECORDS_SQL: &str =
    "SELECT id, filename, \"timestamp\", fingerprint FROM migrations ORDER BY id ASC";

/// SQL for recording an applied script.
pub const INSERT_RECORD_SQL: &str =
    "INSERT INTO migrations (id, filename, \"timestamp\", fingerprint) VALUES ($1, $2, now(), $3)";

/// SQL for filling in a legacy record's missing fingerprint.
pub const BACKFILL_FINGERPRINT_SQL: &str =
    "UPDATE migrations SET fingerprint = $1 \
     WHERE filename = $2 AND (fingerprint IS NULL OR fingerprint = '')";

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Script id, or [`SENTINEL_ID`] for the sentinel.
    pub id: i64,
    /// Script filename.
    pub filename: String,
    /// When the script was applied, as set by the database.
    pub applied_at: NaiveDateTime,
    /// Fingerprint at application time; `None` for legacy rows.
    pub fingerprint: Option<String>,
}

impl MigrationRecord {
    /// Build a record from a `SELECT_RECORDS_SQL` row.
    pub fn from_row(row: &Row) -> MigrateResult<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            filename: row.get_str("filename")?.to_string(),
            applied_at: row.get_timestamp("timestamp")?,
            fingerprint: row.get_opt_str("fingerprint")?.map(String::from),
        })
    }

    /// Check if this is the bootstrap sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }

    /// Whether the record predates fingerprinting.
    pub fn is_legacy(&self) -> bool {
        self.fingerprint.as_deref().is_none_or(str::is_empty)
    }
}

/// Statement that checks for the tracking table.
pub fn table_exists() -> Statement {
    Statement::new(TABLE_EXISTS_SQL)
}

/// Statement that creates the tracking table.
pub fn create_table() -> Statement {
    Statement::new(CREATE_TABLE_SQL)
}

/// Statement that writes the sentinel row.
pub fn insert_sentinel() -> Statement {
    Statement::new(INSERT_SENTINEL_SQL)
        .bind(SENTINEL_ID)
        .bind(SENTINEL_FILENAME)
}

/// Statement that loads all records.
pub fn select_records() -> Statement {
    Statement::new(SELECT_RECORDS_SQL)
}

/// Statement that records `script` as applied.
pub fn insert_record(script: &MigrationScript) -> Statement {
    Statement::new(INSERT_RECORD_SQL)
        .bind(script.id)
        .bind(script.filename.as_str())
        .bind(script.fingerprint.as_str())
}

/// Statement that backfills the fingerprint of a legacy record.
pub fn backfill_fingerprint(script: &MigrationScript) -> Statement {
    Statement::new(BACKFILL_FINGERPRINT_SQL)
        .bind(script.fingerprint.as_str())
        .bind(script.filename.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqlValue;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_record_from_row() {
        let row = Row::new()
            .with("id", 1i64)
            .with("filename", "1_init.sql")
            .with("timestamp", SqlValue::Timestamp(sample_time()))
            .with("fingerprint", "0123456789abcdef0123456789abcdef");

        let record = MigrationRecord::from_row(&row).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.filename, "1_init.sql");
        assert_eq!(record.applied_at, sample_time());
        assert!(!record.is_sentinel());
        assert!(!record.is_legacy());
    }

    #[test]
    fn test_sentinel_and_legacy_record() {
        let row = Row::new()
            .with("id", SENTINEL_ID)
            .with("filename", SENTINEL_FILENAME)
            .with("timestamp", SqlValue::Timestamp(sample_time()))
            .with("fingerprint", SqlValue::Null);

        let record = MigrationRecord::from_row(&row).unwrap();
        assert!(record.is_sentinel());
        assert!(record.is_legacy());
    }

    #[test]
    fn test_record_from_row_missing_column() {
        let row = Row::new().with("id", 1i64);
        assert!(MigrationRecord::from_row(&row).is_err());
    }

    #[test]
    fn test_create_table_sql_shape() {
        assert!(CREATE_TABLE_SQL.contains(MIGRATIONS_TABLE));
        assert!(CREATE_TABLE_SQL.contains("filename    VARCHAR(255) NOT NULL UNIQUE"));
        assert!(CREATE_TABLE_SQL.contains("fingerprint VARCHAR(32)"));
    }

    #[test]
    fn test_insert_record_binds_script() {
        let script = MigrationScript::new("2_add_col.sql", "ALTER TABLE a ADD b INT;").unwrap();
        let stmt = insert_record(&script);

        assert_eq!(stmt.sql, INSERT_RECORD_SQL);
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(2),
                SqlValue::Text("2_add_col.sql".to_string()),
                SqlValue::Text(script.fingerprint.clone()),
            ]
        );
    }
}
