//! SQL executor
//!
//! Applies a migration plan statement by statement. A failure surfaces as
//! `ExecutionError` carrying the statement text; earlier statements have
//! already committed unless the plan ran inside a transaction.

use tracing::info;

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};

/// SQL executor for applying migration plans
pub struct SqlExecutor {
    connection: DatabaseConnection,
}

impl SqlExecutor {
    /// Create a new SQL executor
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Execute a single SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(self.connection.pool())
            .await
            .map_err(|e| Error::ExecutionError {
                statement: sql.to_string(),
                source: e,
            })?;
        Ok(())
    }

    /// Execute multiple SQL statements in order
    pub async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        for (i, statement) in statements.iter().enumerate() {
            info!(
                number = i + 1,
                total = statements.len(),
                statement = statement.as_str(),
                "Executing statement"
            );
            self.execute(statement).await?;
        }

        Ok(())
    }

    /// Execute multiple SQL statements in a single transaction.
    ///
    /// The whole plan runs on one connection acquired from the pool;
    /// transaction state in MySQL is per-session, so issuing BEGIN and
    /// COMMIT as separate pooled queries would not actually isolate
    /// anything.
    pub async fn execute_in_transaction(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        for (i, statement) in statements.iter().enumerate() {
            info!(
                number = i + 1,
                total = statements.len(),
                statement = statement.as_str(),
                "Executing statement"
            );
            if let Err(e) = sqlx::query(statement).execute(&mut *tx).await {
                let _ = tx.rollback().await;
                return Err(Error::ExecutionError {
                    statement: statement.clone(),
                    source: e,
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
