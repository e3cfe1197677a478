//! PostgreSQL connection wrapper.

use deadpool_postgres::Object;
use sqlstep_migrate::{Row, Statement};
use tokio_postgres::GenericClient;
use tokio_postgres::types::ToSql;
use tracing::debug;

use crate::error::PgResult;
use crate::row::to_row;
use crate::types::sql_values_to_params;

/// A pooled PostgreSQL connection. Dropping it returns it to the pool.
pub struct PgConnection {
    client: Object,
}

impl PgConnection {
    pub(crate) fn new(client: Object) -> Self {
        Self { client }
    }

    /// Run raw SQL through the simple query protocol.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Run a gateway statement.
    pub async fn run(&self, statement: &Statement) -> PgResult<Vec<Row>> {
        let client: &tokio_postgres::Client = &self.client;
        run_statement(client, statement).await
    }

    /// Begin a transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("Beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction { txn })
    }
}

/// A PostgreSQL transaction.
///
/// Dropped without [`PgTransaction::commit`], the transaction rolls back.
pub struct PgTransaction<'a> {
    txn: deadpool_postgres::Transaction<'a>,
}

impl PgTransaction<'_> {
    /// Run a gateway statement inside the transaction.
    pub async fn run(&self, statement: &Statement) -> PgResult<Vec<Row>> {
        let txn: &tokio_postgres::Transaction<'_> = &self.txn;
        run_statement(txn, statement).await
    }

    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("Committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("Rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Batches go through the simple query protocol; everything else is
/// prepared and its rows converted.
async fn run_statement<C>(client: &C, statement: &Statement) -> PgResult<Vec<Row>>
where
    C: GenericClient + Sync,
{
    if statement.is_batch() {
        debug!(sql = %statement, "Executing batch");
        client.batch_execute(&statement.sql).await?;
        return Ok(Vec::new());
    }

    debug!(sql = %statement, params = statement.params.len(), "Executing statement");

    let params = sql_values_to_params(&statement.params);
    let param_refs: Vec<&(dyn ToSql + Sync)> =
        params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();

    let rows = client.query(statement.sql.as_str(), &param_refs).await?;
    rows.iter().map(to_row).collect()
}
