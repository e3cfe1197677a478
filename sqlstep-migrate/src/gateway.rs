//! Persistence gateway contract.
//!
//! The engine talks to the database only through [`PersistenceGateway`],
//! which runs raw SQL and reports the outcome as a value. Gateways never
//! return `Err` and never panic on SQL errors; every failure, including a
//! failed commit or rollback, comes back as [`ExecOutcome::Failure`].

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::{MigrateResult, MigrationError};

/// A driver-neutral SQL value, used both for parameters and for columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Text.
    Text(String),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A SQL statement and its parameters.
///
/// A regular statement is one prepared command using `$1`, `$2`, ...
/// placeholders and may return rows. A batch is sent as-is, may contain
/// several `;`-separated commands, takes no parameters and returns no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<SqlValue>,
    batch: bool,
}

impl Statement {
    /// Create a single prepared statement.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            batch: false,
        }
    }

    /// Create a batch of one or more commands, such as a script body.
    pub fn batch(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            batch: true,
        }
    }

    /// Whether this is a batch.
    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Add a parameter. Batches ignore parameters.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Whether the statement carries parameters.
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql.trim())
    }
}

/// A result row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Look up a column value by name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn require(&self, column: &str) -> MigrateResult<&SqlValue> {
        self.get(column)
            .ok_or_else(|| MigrationError::persistence(format!("missing column '{}'", column)))
    }

    /// Get an integer column.
    pub fn get_i64(&self, column: &str) -> MigrateResult<i64> {
        match self.require(column)? {
            SqlValue::Int(v) => Ok(*v),
            other => Err(type_mismatch(column, "integer", other)),
        }
    }

    /// Get a boolean column.
    pub fn get_bool(&self, column: &str) -> MigrateResult<bool> {
        match self.require(column)? {
            SqlValue::Bool(v) => Ok(*v),
            other => Err(type_mismatch(column, "boolean", other)),
        }
    }

    /// Get a non-null text column.
    pub fn get_str(&self, column: &str) -> MigrateResult<&str> {
        match self.require(column)? {
            SqlValue::Text(v) => Ok(v),
            other => Err(type_mismatch(column, "text", other)),
        }
    }

    /// Get a nullable text column.
    pub fn get_opt_str(&self, column: &str) -> MigrateResult<Option<&str>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v)),
            other => Err(type_mismatch(column, "text", other)),
        }
    }

    /// Get a timestamp column.
    pub fn get_timestamp(&self, column: &str) -> MigrateResult<NaiveDateTime> {
        match self.require(column)? {
            SqlValue::Timestamp(v) => Ok(*v),
            other => Err(type_mismatch(column, "timestamp", other)),
        }
    }
}

fn type_mismatch(column: &str, expected: &str, found: &SqlValue) -> MigrationError {
    MigrationError::persistence(format!(
        "column '{}' expected {}, found {:?}",
        column, expected, found
    ))
}

/// Outcome of running SQL through a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The SQL ran; rows returned by the (last) statement.
    Success {
        /// Returned rows.
        rows: Vec<Row>,
    },
    /// The SQL failed and any transaction was rolled back.
    Failure {
        /// Error message from the driver or pool.
        message: String,
    },
}

impl ExecOutcome {
    /// Create a success outcome.
    pub fn success(rows: Vec<Row>) -> Self {
        Self::Success { rows }
    }

    /// Create a failure outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Check if this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Convert into a `Result`, mapping the failure message with `on_failure`.
    pub fn into_result<E>(self, on_failure: impl FnOnce(String) -> E) -> Result<Vec<Row>, E> {
        match self {
            Self::Success { rows } => Ok(rows),
            Self::Failure { message } => Err(on_failure(message)),
        }
    }
}

/// Executes SQL against the target database.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Run one statement directly on the pool, with the pool's autocommit
    /// semantics.
    async fn execute(&self, statement: &Statement) -> ExecOutcome;

    /// Run statements in order on one dedicated connection inside an explicit
    /// transaction. Commits if all succeed, rolls back on the first failure.
    /// The connection goes back to the pool on every path.
    async fn execute_in_transaction(&self, statements: &[Statement]) -> ExecOutcome;
}

#[async_trait]
impl<G: PersistenceGateway + ?Sized> PersistenceGateway for std::sync::Arc<G> {
    async fn execute(&self, statement: &Statement) -> ExecOutcome {
        (**self).execute(statement).await
    }

    async fn execute_in_transaction(&self, statements: &[Statement]) -> ExecOutcome {
        (**self).execute_in_transaction(statements).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_bind() {
        let stmt = Statement::new("INSERT INTO t VALUES ($1, $2, $3)")
            .bind(1i64)
            .bind("name")
            .bind(Option::<String>::None);

        assert!(stmt.has_params());
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(1),
                SqlValue::Text("name".to_string()),
                SqlValue::Null
            ]
        );
        assert!(!stmt.is_batch());
        assert!(!Statement::new("SELECT 1").has_params());
    }

    #[test]
    fn test_batch_statement() {
        let stmt = Statement::batch("CREATE TABLE a(); CREATE TABLE b();");
        assert!(stmt.is_batch());
        assert!(!stmt.has_params());
        assert_eq!(stmt.to_string(), "CREATE TABLE a(); CREATE TABLE b();");
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new()
            .with("id", 3i64)
            .with("filename", "3_x.sql")
            .with("fingerprint", Option::<String>::None);

        assert_eq!(row.get_i64("id").unwrap(), 3);
        assert_eq!(row.get_str("filename").unwrap(), "3_x.sql");
        assert_eq!(row.get_opt_str("fingerprint").unwrap(), None);
        assert!(row.get_i64("filename").is_err());
        assert!(row.get_str("missing").is_err());
    }

    #[test]
    fn test_outcome_into_result() {
        let ok = ExecOutcome::success(vec![Row::new().with("exists", SqlValue::Bool(true))]);
        assert!(ok.is_success());
        assert_eq!(ok.into_result(MigrationError::persistence).unwrap().len(), 1);

        let err = ExecOutcome::failure("relation does not exist")
            .into_result(MigrationError::persistence)
            .unwrap_err();
        assert!(err.to_string().contains("relation does not exist"));
    }
}
