//! Live-database schema introspection
//!
//! Builds the same model the DDL parser produces, by querying the
//! connected database's information schema.

use sqlx::FromRow;
use tracing::debug;

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::types::{Column, ForeignKey, Index, ReferenceAction, Schema, Table};

#[derive(FromRow)]
struct TableRow {
    table_name: String,
    engine: Option<String>,
    table_collation: Option<String>,
    table_comment: Option<String>,
    auto_increment: Option<u64>,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_default: Option<String>,
    extra: String,
    column_comment: Option<String>,
    character_set_name: Option<String>,
    collation_name: Option<String>,
}

#[derive(FromRow)]
struct IndexRow {
    index_name: String,
    column_name: String,
    non_unique: i64,
    index_type: String,
    index_comment: Option<String>,
}

#[derive(FromRow)]
struct ForeignKeyRow {
    constraint_name: String,
    column_name: String,
    referenced_table_name: String,
    referenced_column_name: String,
    update_rule: String,
    delete_rule: String,
}

/// Schema analyzer for database schema introspection
pub struct SchemaAnalyzer {
    connection: DatabaseConnection,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Read the current database's schema: base tables only, in name
    /// order. The snapshot is best-effort; concurrent DDL during the read
    /// is the caller's problem.
    pub async fn analyze(&self) -> Result<Schema> {
        let mut schema = Schema::new();

        let sql = r#"
            SELECT
                TABLE_NAME AS table_name,
                ENGINE AS engine,
                TABLE_COLLATION AS table_collation,
                TABLE_COMMENT AS table_comment,
                AUTO_INCREMENT AS auto_increment
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let table_rows = sqlx::query_as::<_, TableRow>(sql)
            .fetch_all(self.connection.pool())
            .await?;

        debug!(tables = table_rows.len(), "introspecting database schema");

        for row in table_rows {
            let table = self.analyze_table(row).await?;
            table.validate()?;
            schema.add_table(table);
        }

        Ok(schema)
    }

    async fn analyze_table(&self, row: TableRow) -> Result<Table> {
        let mut table = Table::new(&row.table_name);
        table.options.engine = row.engine.unwrap_or_else(|| "InnoDB".to_string());
        table.options.collation = row.table_collation;
        table.options.comment = none_if_empty(row.table_comment);
        table.options.auto_increment = row.auto_increment;

        self.analyze_columns(&mut table).await?;
        self.analyze_indexes(&mut table).await?;
        self.analyze_foreign_keys(&mut table).await?;

        Ok(table)
    }

    async fn analyze_columns(&self, table: &mut Table) -> Result<()> {
        let sql = r#"
            SELECT
                COLUMN_NAME AS column_name,
                COLUMN_TYPE AS column_type,
                IS_NULLABLE AS is_nullable,
                COLUMN_DEFAULT AS column_default,
                EXTRA AS extra,
                COLUMN_COMMENT AS column_comment,
                CHARACTER_SET_NAME AS character_set_name,
                COLLATION_NAME AS collation_name
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(&table.name)
            .fetch_all(self.connection.pool())
            .await?;

        for row in rows {
            // the model only represents auto_increment; MySQL 8 noise like
            // DEFAULT_GENERATED is discarded
            let extra = if row.extra.to_lowercase().contains("auto_increment") {
                "auto_increment".to_string()
            } else {
                String::new()
            };

            table.add_column(Column {
                name: row.column_name,
                data_type: row.column_type,
                nullable: row.is_nullable == "YES",
                default: row.column_default,
                extra,
                comment: none_if_empty(row.column_comment),
                charset: row.character_set_name,
                collation: row.collation_name,
            });
        }

        Ok(())
    }

    async fn analyze_indexes(&self, table: &mut Table) -> Result<()> {
        let sql = r#"
            SELECT
                INDEX_NAME AS index_name,
                COLUMN_NAME AS column_name,
                CAST(NON_UNIQUE AS SIGNED) AS non_unique,
                INDEX_TYPE AS index_type,
                INDEX_COMMENT AS index_comment
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;

        let rows = sqlx::query_as::<_, IndexRow>(sql)
            .bind(&table.name)
            .fetch_all(self.connection.pool())
            .await?;

        for row in rows {
            table
                .indexes
                .entry(row.index_name.clone())
                .or_insert_with(|| {
                    let mut index = Index::new(&row.index_name, Vec::new(), row.non_unique == 0);
                    index.index_type = row.index_type;
                    index.comment = none_if_empty(row.index_comment);
                    index
                })
                .columns
                .push(row.column_name);
        }

        Ok(())
    }

    async fn analyze_foreign_keys(&self, table: &mut Table) -> Result<()> {
        let sql = r#"
            SELECT
                kcu.CONSTRAINT_NAME AS constraint_name,
                kcu.COLUMN_NAME AS column_name,
                kcu.REFERENCED_TABLE_NAME AS referenced_table_name,
                kcu.REFERENCED_COLUMN_NAME AS referenced_column_name,
                rc.UPDATE_RULE AS update_rule,
                rc.DELETE_RULE AS delete_rule
            FROM information_schema.KEY_COLUMN_USAGE kcu
            JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
                ON rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                AND rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
            WHERE kcu.TABLE_SCHEMA = DATABASE()
                AND kcu.TABLE_NAME = ?
                AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#;

        let rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
            .bind(&table.name)
            .fetch_all(self.connection.pool())
            .await?;

        for row in rows {
            let on_update = parse_rule(&row.update_rule, &row.constraint_name)?;
            let on_delete = parse_rule(&row.delete_rule, &row.constraint_name)?;

            let fk = table
                .foreign_keys
                .entry(row.constraint_name.clone())
                .or_insert_with(|| ForeignKey {
                    name: row.constraint_name.clone(),
                    columns: Vec::new(),
                    referenced_table: row.referenced_table_name.clone(),
                    referenced_columns: Vec::new(),
                    on_update,
                    on_delete,
                });
            fk.columns.push(row.column_name);
            fk.referenced_columns.push(row.referenced_column_name);
        }

        Ok(())
    }
}

fn parse_rule(rule: &str, constraint: &str) -> Result<ReferenceAction> {
    ReferenceAction::parse(rule).ok_or_else(|| {
        Error::IntrospectionError(format!(
            "unsupported referential rule `{}` on constraint `{}`",
            rule, constraint
        ))
    })
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
