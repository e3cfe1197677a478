//! PostgreSQL persistence gateway.

use async_trait::async_trait;
use sqlstep_migrate::{ExecOutcome, PersistenceGateway, Row, Statement};
use tracing::{debug, warn};

use crate::error::{PgError, PgResult};
use crate::pool::PgPool;

/// [`PersistenceGateway`] backed by a [`PgPool`].
///
/// Every call checks a connection out of the pool and drops it before
/// returning, on success and on failure alike.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Create a gateway over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a gateway from a database URL with default pool settings.
    pub async fn connect(url: impl Into<String>) -> PgResult<Self> {
        let pool = PgPool::builder().url(url).build().await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn try_execute(&self, statement: &Statement) -> PgResult<Vec<Row>> {
        let conn = self.pool.get().await?;
        conn.run(statement).await
    }

    async fn try_execute_in_transaction(&self, statements: &[Statement]) -> PgResult<Vec<Row>> {
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;

        let mut rows = Vec::new();
        for statement in statements {
            let result = txn.run(statement).await;
            match result {
                Ok(result) => rows = result,
                Err(error) => {
                    return match txn.rollback().await {
                        Ok(()) => Err(error),
                        Err(rollback) => Err(PgError::Rollback {
                            error: Box::new(error),
                            rollback: Box::new(rollback),
                        }),
                    };
                }
            }
        }

        txn.commit().await?;
        Ok(rows)
    }
}

fn into_outcome(result: PgResult<Vec<Row>>) -> ExecOutcome {
    match result {
        Ok(rows) => ExecOutcome::success(rows),
        Err(e) => {
            let message = e.describe();
            if e.is_connection_error() {
                warn!(error = %message, "Database unavailable");
            } else {
                debug!(error = %message, sql_state = ?e.sql_state(), "Statement failed");
            }
            ExecOutcome::failure(message)
        }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn execute(&self, statement: &Statement) -> ExecOutcome {
        into_outcome(self.try_execute(statement).await)
    }

    async fn execute_in_transaction(&self, statements: &[Statement]) -> ExecOutcome {
        into_outcome(self.try_execute_in_transaction(statements).await)
    }
}
