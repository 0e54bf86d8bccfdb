//! Database connection handling
//!
//! This module provides functionality to establish and manage the MySQL
//! connection pool.

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// A handle to the target MySQL database
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: MySqlPool,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(5))
            .acquire_timeout(Duration::from_secs(config.timeout_seconds.unwrap_or(30)))
            .connect(&config.connection_url())
            .await
            .map_err(|e| Error::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// The underlying pool, for prepared introspection queries
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Execute a SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, releasing all connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
