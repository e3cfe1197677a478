//! In-memory gateway for engine tests.
//!
//! Understands the tracking-table statements from [`crate::history`] and
//! treats everything else as a script body.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::gateway::{ExecOutcome, PersistenceGateway, Row, SqlValue, Statement};
use crate::history::{self, MigrationRecord};

/// A script body the gateway ran.
#[derive(Debug, Clone)]
pub(crate) struct ExecutedScript {
    pub sql: String,
    pub transactional: bool,
}

#[derive(Debug, Clone, Default)]
struct State {
    table_exists: bool,
    records: Vec<MigrationRecord>,
    executed: Vec<ExecutedScript>,
    create_table_calls: usize,
}

#[derive(Debug, Default)]
pub(crate) struct FakeGateway {
    state: Mutex<State>,
    fail_on: Vec<String>,
    fail_table_check: bool,
    fail_record_insert: bool,
}

fn applied_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) => Some(s.clone()),
        _ => None,
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the tracking table and its sentinel in place.
    pub fn with_table(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.table_exists = true;
            state.records.push(MigrationRecord {
                id: history::SENTINEL_ID,
                filename: history::SENTINEL_FILENAME.to_string(),
                applied_at: applied_at(),
                fingerprint: None,
            });
        }
        self
    }

    /// Seed a history record.
    pub fn with_record(self, id: i64, filename: &str, fingerprint: Option<&str>) -> Self {
        self.state.lock().unwrap().records.push(MigrationRecord {
            id,
            filename: filename.to_string(),
            applied_at: applied_at(),
            fingerprint: fingerprint.map(String::from),
        });
        self
    }

    /// Fail any script body containing `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Fail the table existence check.
    pub fn fail_table_check(mut self) -> Self {
        self.fail_table_check = true;
        self
    }

    /// Fail every script record insert. The sentinel insert still succeeds.
    pub fn fail_record_insert(mut self) -> Self {
        self.fail_record_insert = true;
        self
    }

    pub fn table_exists(&self) -> bool {
        self.state.lock().unwrap().table_exists
    }

    /// Records sorted by id.
    pub fn records(&self) -> Vec<MigrationRecord> {
        let mut records = self.state.lock().unwrap().records.clone();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn executed(&self) -> Vec<ExecutedScript> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn create_table_calls(&self) -> usize {
        self.state.lock().unwrap().create_table_calls
    }

    fn apply(&self, state: &mut State, stmt: &Statement, transactional: bool) -> Result<Vec<Row>, String> {
        match stmt.sql.as_str() {
            history::TABLE_EXISTS_SQL => {
                if self.fail_table_check {
                    return Err("connection refused".to_string());
                }
                Ok(vec![Row::new().with("table_exists", SqlValue::Bool(state.table_exists))])
            }
            history::CREATE_TABLE_SQL => {
                if state.table_exists {
                    return Err("relation \"migrations\" already exists".to_string());
                }
                state.table_exists = true;
                state.create_table_calls += 1;
                Ok(Vec::new())
            }
            history::INSERT_RECORD_SQL if self.fail_record_insert => {
                Err("could not write record: disk full".to_string())
            }
            history::INSERT_SENTINEL_SQL | history::INSERT_RECORD_SQL => {
                Self::require_table(state)?;
                let id = match stmt.params.first() {
                    Some(SqlValue::Int(id)) => *id,
                    other => return Err(format!("bad id parameter: {:?}", other)),
                };
                let filename = stmt.params.get(1).and_then(text).ok_or("bad filename parameter")?;
                let fingerprint = stmt.params.get(2).and_then(text);

                if state.records.iter().any(|r| r.id == id || r.filename == filename) {
                    return Err("duplicate key value violates unique constraint".to_string());
                }
                state.records.push(MigrationRecord {
                    id,
                    filename,
                    applied_at: applied_at(),
                    fingerprint,
                });
                Ok(Vec::new())
            }
            history::SELECT_RECORDS_SQL => {
                Self::require_table(state)?;
                let mut records = state.records.clone();
                records.sort_by_key(|r| r.id);
                Ok(records
                    .into_iter()
                    .map(|r| {
                        Row::new()
                            .with("id", r.id)
                            .with("filename", r.filename)
                            .with("timestamp", SqlValue::Timestamp(r.applied_at))
                            .with("fingerprint", r.fingerprint)
                    })
                    .collect())
            }
            history::BACKFILL_FINGERPRINT_SQL => {
                Self::require_table(state)?;
                let fingerprint = stmt.params.first().and_then(text);
                let filename = stmt.params.get(1).and_then(text);
                for record in state.records.iter_mut() {
                    if Some(&record.filename) == filename.as_ref() && record.is_legacy() {
                        record.fingerprint = fingerprint.clone();
                    }
                }
                Ok(Vec::new())
            }
            sql => {
                if !stmt.is_batch() {
                    return Err(format!("unexpected prepared statement: {}", sql));
                }
                if let Some(needle) = self.fail_on.iter().find(|n| sql.contains(n.as_str())) {
                    return Err(format!("syntax error at or near \"{}\"", needle));
                }
                state.executed.push(ExecutedScript {
                    sql: sql.to_string(),
                    transactional,
                });
                Ok(Vec::new())
            }
        }
    }

    fn require_table(state: &State) -> Result<(), String> {
        if state.table_exists {
            Ok(())
        } else {
            Err("relation \"migrations\" does not exist".to_string())
        }
    }
}

#[async_trait]
impl PersistenceGateway for FakeGateway {
    async fn execute(&self, statement: &Statement) -> ExecOutcome {
        let mut state = self.state.lock().unwrap();
        match self.apply(&mut state, statement, false) {
            Ok(rows) => ExecOutcome::success(rows),
            Err(message) => ExecOutcome::failure(message),
        }
    }

    async fn execute_in_transaction(&self, statements: &[Statement]) -> ExecOutcome {
        let mut state = self.state.lock().unwrap();
        let mut working = state.clone();
        let mut rows = Vec::new();

        for statement in statements {
            match self.apply(&mut working, statement, true) {
                Ok(r) => rows = r,
                Err(message) => return ExecOutcome::failure(message),
            }
        }

        *state = working;
        ExecOutcome::success(rows)
    }
}
