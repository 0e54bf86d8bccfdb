//! mysqldiff: declarative schema synchronization for MySQL databases
//!
//! Given a target schema written as a file of `CREATE TABLE` statements,
//! mysqldiff computes the minimal ordered set of DDL statements that
//! brings a live database in line with the target, and optionally applies
//! them.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;


// Re-export main types for easier access
pub use config::Config;
pub use db::connection::DatabaseConnection;
pub use error::{Error, Result};
pub use schema::analyzer::SchemaAnalyzer;
pub use schema::diff::SchemaDiff;
pub use schema::generator::MigrationGenerator;
pub use schema::parser::DdlParser;
pub use schema::types::Schema;

use db::executor::SqlExecutor;
use schema::generator::normalize_ddl;
use tracing::info;

/// Initialize mysqldiff with the specified configuration file
pub async fn init(config_path: &str) -> Result<SyncClient> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;
    SyncClient::new(config).await
}

/// The main client tying the pipeline together
pub struct SyncClient {
    config: Config,
    connection: DatabaseConnection,
}

impl SyncClient {
    /// Create a new client from configuration
    pub async fn new(config: Config) -> Result<Self> {
        let connection = DatabaseConnection::connect(&config.database).await?;
        Ok(Self { config, connection })
    }

    /// Parse a target schema from DDL text
    pub fn load_target(&self, ddl: &str) -> Result<Schema> {
        DdlParser::parse(ddl)
    }

    /// Parse a target schema from a DDL file
    pub fn load_target_file(&self, path: &str) -> Result<Schema> {
        let ddl = std::fs::read_to_string(path)?;
        DdlParser::parse(&ddl)
    }

    /// Introspect the current schema of the connected database
    pub async fn introspect(&self) -> Result<Schema> {
        SchemaAnalyzer::new(self.connection.clone()).analyze().await
    }

    /// Compute the migration plan that transforms the live schema into
    /// the desired one. An empty plan means the schemas already agree.
    pub async fn plan(&self, desired: &Schema) -> Result<Vec<String>> {
        let current = self.introspect().await?;
        let generator = MigrationGenerator::new();

        // fast path: byte-equal normalized renders need no diffing
        let current_render = normalize_ddl(&generator.render_schema(&current))?;
        let desired_render = normalize_ddl(&generator.render_schema(desired))?;
        if current_render == desired_render {
            info!("schemas are identical, nothing to do");
            return Ok(Vec::new());
        }

        let diff = SchemaDiff::generate(&current, desired, &self.config.sync);
        if diff.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            create = diff.tables_to_create.len(),
            alter = diff.tables_to_alter.len(),
            "computed schema delta"
        );
        Ok(generator.plan(&diff, desired))
    }

    /// Apply a migration plan, honoring the dry-run and transaction
    /// settings.
    pub async fn apply(&self, statements: &[String]) -> Result<()> {
        if self.config.sync.dry_run {
            for statement in statements {
                info!(statement = statement.as_str(), "DDL (dry run)");
            }
            return Ok(());
        }

        let executor = SqlExecutor::new(self.connection.clone());
        if self.config.sync.transaction {
            executor.execute_in_transaction(statements).await
        } else {
            executor.execute_batch(statements).await
        }
    }

    /// Complete workflow: parse the target, plan, and apply.
    /// Returns the plan that was applied (possibly empty).
    pub async fn sync(&self, ddl: &str) -> Result<Vec<String>> {
        let desired = self.load_target(ddl)?;
        let statements = self.plan(&desired).await?;

        if statements.is_empty() {
            info!("database schema is already in sync");
            return Ok(statements);
        }

        self.apply(&statements).await?;
        Ok(statements)
    }

    /// Release the connection pool
    pub async fn close(&self) {
        self.connection.close().await;
    }
}
