//! DDL generator
//!
//! Renders a schema as `CREATE TABLE` statements and a diff as an ordered
//! sequence of migration statements. Within one table the order is fixed:
//! drop foreign keys, drop indexes, add columns, modify columns, drop
//! columns, add indexes, add foreign keys, change options — drops before
//! adds so replaced indexes and constraints never collide.

use crate::schema::diff::{SchemaDiff, TableDelta};
use crate::schema::types::{
    is_string_type, Column, ForeignKey, Index, ReferenceAction, Schema, Table, TableOptions,
    PRIMARY_KEY_NAME,
};
use crate::schema::parser;
use crate::error::Result;
use crate::utils::naming::{escape_string, quote_identifier};

/// Migration SQL generator
#[derive(Debug, Default)]
pub struct MigrationGenerator;

impl MigrationGenerator {
    /// Create a new migration generator
    pub fn new() -> Self {
        Self
    }

    /// Render every table of a schema as `CREATE TABLE` statements.
    pub fn render_schema(&self, schema: &Schema) -> String {
        schema
            .tables
            .values()
            .map(|table| self.create_table_sql(table))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The full migration plan for a diff: `CREATE TABLE` statements first,
    /// then per-table alterations, tables in name order throughout.
    pub fn plan(&self, diff: &SchemaDiff, desired: &Schema) -> Vec<String> {
        let mut statements = Vec::new();

        for name in &diff.tables_to_create {
            if let Some(table) = desired.table(name) {
                statements.push(self.create_table_sql(table));
            }
        }

        for (name, delta) in &diff.tables_to_alter {
            statements.extend(self.alter_table_sql(name, delta));
        }

        statements
    }

    /// Render one `CREATE TABLE` statement.
    pub fn create_table_sql(&self, table: &Table) -> String {
        let mut parts = Vec::new();

        for column in &table.columns {
            parts.push(format!("  {}", self.column_sql(column)));
        }

        if let Some(pk) = table.primary_key() {
            parts.push(format!("  PRIMARY KEY ({})", column_list(&pk.columns)));
        }
        for (name, index) in &table.indexes {
            if name != PRIMARY_KEY_NAME {
                parts.push(format!("  {}", self.index_sql(index)));
            }
        }
        for fk in table.foreign_keys.values() {
            parts.push(format!("  {}", self.foreign_key_sql(fk)));
        }

        format!(
            "CREATE TABLE {} (\n{}\n){};",
            quote_identifier(&table.name),
            parts.join(",\n"),
            self.table_options_sql(&table.options)
        )
    }

    /// The ordered `ALTER TABLE` statements for one table's delta.
    pub fn alter_table_sql(&self, table: &str, delta: &TableDelta) -> Vec<String> {
        let target = quote_identifier(table);
        let mut statements = Vec::new();

        for name in &delta.foreign_keys_to_drop {
            statements.push(format!(
                "ALTER TABLE {} DROP FOREIGN KEY {};",
                target,
                quote_identifier(name)
            ));
        }

        for name in &delta.indexes_to_drop {
            if name == PRIMARY_KEY_NAME {
                statements.push(format!("ALTER TABLE {} DROP PRIMARY KEY;", target));
            } else {
                statements.push(format!(
                    "ALTER TABLE {} DROP INDEX {};",
                    target,
                    quote_identifier(name)
                ));
            }
        }

        for column in &delta.columns_to_add {
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN {};",
                target,
                self.column_sql(column)
            ));
        }

        for change in &delta.columns_to_modify {
            statements.push(format!(
                "ALTER TABLE {} MODIFY COLUMN {};",
                target,
                self.column_sql(&change.desired)
            ));
        }

        for name in &delta.columns_to_drop {
            statements.push(format!(
                "ALTER TABLE {} DROP COLUMN {};",
                target,
                quote_identifier(name)
            ));
        }

        for (name, index) in &delta.indexes_to_add {
            if name == PRIMARY_KEY_NAME {
                statements.push(format!(
                    "ALTER TABLE {} ADD PRIMARY KEY ({});",
                    target,
                    column_list(&index.columns)
                ));
            } else {
                statements.push(format!("ALTER TABLE {} ADD {};", target, self.index_sql(index)));
            }
        }

        for fk in delta.foreign_keys_to_add.values() {
            statements.push(format!(
                "ALTER TABLE {} ADD {};",
                target,
                self.foreign_key_sql(fk)
            ));
        }

        if let Some(engine) = &delta.option_changes.engine {
            statements.push(format!("ALTER TABLE {} ENGINE={};", target, engine));
        }
        if let Some(collation) = &delta.option_changes.collation {
            statements.push(format!("ALTER TABLE {} COLLATE={};", target, collation));
        }

        statements
    }

    /// Render one column definition.
    pub fn column_sql(&self, column: &Column) -> String {
        let mut sql = format!("{} {}", quote_identifier(&column.name), column.data_type);

        if let Some(charset) = &column.charset {
            sql.push_str(" CHARACTER SET ");
            sql.push_str(charset);
        }
        if let Some(collation) = &column.collation {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        sql.push_str(&self.default_sql(column));
        if column.extra == "auto_increment" {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(&format!(" COMMENT '{}'", escape_string(comment)));
        }

        sql
    }

    /// The DEFAULT clause for a column.
    ///
    /// A nullable column with no default still gets `DEFAULT NULL`, to
    /// match dump output; a non-nullable column with no default gets no
    /// clause at all.
    fn default_sql(&self, column: &Column) -> String {
        match &column.default {
            None if column.nullable => " DEFAULT NULL".to_string(),
            None => String::new(),
            Some(value) => {
                let literal = if is_string_type(&column.data_type) || value.is_empty() {
                    format!("'{}'", escape_string(value))
                } else if is_numeric_literal(value) || value.eq_ignore_ascii_case("null") {
                    value.clone()
                } else if is_expression_default(value) {
                    value.clone()
                } else {
                    // date/time literals and anything else textual
                    format!("'{}'", escape_string(value))
                };
                format!(" DEFAULT {}", literal)
            }
        }
    }

    fn index_sql(&self, index: &Index) -> String {
        let keyword = if index.unique { "UNIQUE KEY" } else { "KEY" };
        format!(
            "{} {} ({})",
            keyword,
            quote_identifier(&index.name),
            column_list(&index.columns)
        )
    }

    fn foreign_key_sql(&self, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_identifier(&fk.name),
            column_list(&fk.columns),
            quote_identifier(&fk.referenced_table),
            column_list(&fk.referenced_columns)
        );
        // RESTRICT is the engine default, dumps leave it implicit
        if fk.on_delete != ReferenceAction::Restrict {
            sql.push_str(" ON DELETE ");
            sql.push_str(fk.on_delete.as_sql());
        }
        if fk.on_update != ReferenceAction::Restrict {
            sql.push_str(" ON UPDATE ");
            sql.push_str(fk.on_update.as_sql());
        }
        sql
    }

    fn table_options_sql(&self, options: &TableOptions) -> String {
        let mut sql = format!(" ENGINE={}", options.engine);
        if let Some(collation) = &options.collation {
            sql.push_str(&format!(" COLLATE={}", collation));
        }
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(" COMMENT='{}'", escape_string(comment)));
        }
        if let Some(auto_increment) = options.auto_increment {
            sql.push_str(&format!(" AUTO_INCREMENT={}", auto_increment));
        }
        sql
    }
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_numeric_literal(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn is_expression_default(value: &str) -> bool {
    // unquoted values only reach here with a trailing paren group when the
    // parser read a function call (NOW(), CURRENT_TIMESTAMP(6), uuid())
    value.starts_with('(')
        || value.ends_with(')')
        || value.eq_ignore_ascii_case("current_timestamp")
}

/// Normalize rendered DDL for the no-change fast path: lower-case outside
/// quoted spans, comments and dump boilerplate removed, whitespace
/// collapsed, and no incidental spacing around punctuation. Two schemas
/// whose normalized renders are byte-equal need no plan at all.
pub fn normalize_ddl(sql: &str) -> Result<String> {
    let cleaned = parser::strip_comments(sql)?;
    let mut out = String::with_capacity(cleaned.len());

    for (_, statement) in parser::split_top_level(&cleaned, 0, ';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        let head: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if head.eq_ignore_ascii_case("set") || head.eq_ignore_ascii_case("drop") {
            continue;
        }

        normalize_statement(trimmed, &mut out);
        out.push(';');
    }

    Ok(out)
}

fn normalize_statement(statement: &str, out: &mut String) {
    let mut pending_space = false;
    let mut chars = statement.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_tight = matches!(out.chars().last(), Some('(' | ')' | ',' | '=' | ';'));
            let next_tight = matches!(ch, '(' | ')' | ',' | '=' | ';');
            if !out.is_empty() && !prev_tight && !next_tight {
                out.push(' ');
            }
            pending_space = false;
        }

        match ch {
            '\'' | '"' | '`' => {
                // quoted spans are copied exactly, case included
                out.push(ch);
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if inner == ch {
                        break;
                    }
                }
            }
            _ => out.push(ch.to_ascii_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::schema::parser::DdlParser;
    use pretty_assertions::assert_eq;

    fn parse(ddl: &str) -> Schema {
        DdlParser::parse(ddl).unwrap()
    }

    #[test]
    fn renders_create_table() {
        let schema = parse(
            "CREATE TABLE `t` (`id` int(11) NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`)) ENGINE=InnoDB;",
        );
        let sql = MigrationGenerator::new().create_table_sql(schema.table("t").unwrap());
        assert_eq!(
            sql,
            "CREATE TABLE `t` (\n  `id` int(11) NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB;"
        );
    }

    #[test]
    fn nullable_columns_get_default_null() {
        let generator = MigrationGenerator::new();
        let column = Column::new("note", "varchar(16)");
        assert_eq!(generator.column_sql(&column), "`note` varchar(16) DEFAULT NULL");

        let column = Column::new("note", "varchar(16)").nullable(false);
        assert_eq!(generator.column_sql(&column), "`note` varchar(16) NOT NULL");
    }

    #[test]
    fn string_defaults_are_quoted_numeric_are_not() {
        let generator = MigrationGenerator::new();

        let column = Column::new("email", "varchar(255)").nullable(false).default("");
        assert_eq!(
            generator.column_sql(&column),
            "`email` varchar(255) NOT NULL DEFAULT ''"
        );

        let column = Column::new("amount", "decimal(20,8)").nullable(false).default("0");
        assert_eq!(
            generator.column_sql(&column),
            "`amount` decimal(20,8) NOT NULL DEFAULT 0"
        );

        let column = Column::new("code", "varchar(8)").nullable(false).default("123");
        assert_eq!(
            generator.column_sql(&column),
            "`code` varchar(8) NOT NULL DEFAULT '123'"
        );

        let column = Column::new("starts_on", "date").nullable(false).default("2024-01-01");
        assert_eq!(
            generator.column_sql(&column),
            "`starts_on` date NOT NULL DEFAULT '2024-01-01'"
        );

        let column = Column::new("created_at", "timestamp")
            .nullable(false)
            .default("CURRENT_TIMESTAMP");
        assert_eq!(
            generator.column_sql(&column),
            "`created_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn function_call_defaults_are_not_quoted() {
        let generator = MigrationGenerator::new();

        let column = Column::new("updated_at", "datetime").nullable(false).default("NOW()");
        assert_eq!(
            generator.column_sql(&column),
            "`updated_at` datetime NOT NULL DEFAULT NOW()"
        );

        let column = Column::new("expires_at", "timestamp")
            .nullable(false)
            .default("CURRENT_TIMESTAMP(6)");
        assert_eq!(
            generator.column_sql(&column),
            "`expires_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP(6)"
        );
    }

    #[test]
    fn escapes_comments_and_defaults() {
        let generator = MigrationGenerator::new();
        let mut column = Column::new("a", "varchar(8)").nullable(false).default("it's");
        column.comment = Some("user's note".to_string());
        assert_eq!(
            generator.column_sql(&column),
            "`a` varchar(8) NOT NULL DEFAULT 'it\\'s' COMMENT 'user\\'s note'"
        );
    }

    #[test]
    fn alter_statements_follow_the_fixed_order() {
        let current = parse(
            "CREATE TABLE users (
                id INT NOT NULL,
                email VARCHAR(255) NOT NULL,
                user_id INT NOT NULL,
                KEY email (email),
                CONSTRAINT fk_a FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE RESTRICT
            );",
        );
        let desired = parse(
            "CREATE TABLE users (
                id INT NOT NULL,
                email VARCHAR(255) NOT NULL,
                user_id INT NOT NULL,
                nickname VARCHAR(32) NOT NULL DEFAULT '',
                UNIQUE KEY email (email),
                CONSTRAINT fk_a FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );",
        );

        let diff = SchemaDiff::generate(&current, &desired, &SyncConfig::default());
        let statements =
            MigrationGenerator::new().alter_table_sql("users", &diff.tables_to_alter["users"]);

        assert_eq!(
            statements,
            vec![
                "ALTER TABLE `users` DROP FOREIGN KEY `fk_a`;",
                "ALTER TABLE `users` DROP INDEX `email`;",
                "ALTER TABLE `users` ADD COLUMN `nickname` varchar(32) NOT NULL DEFAULT '';",
                "ALTER TABLE `users` ADD UNIQUE KEY `email` (`email`);",
                "ALTER TABLE `users` ADD CONSTRAINT `fk_a` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE;",
            ]
        );
    }

    #[test]
    fn creates_precede_alters_in_plans() {
        let current = parse("CREATE TABLE b (id INT NOT NULL);");
        let desired = parse(
            "CREATE TABLE a (id INT NOT NULL);
             CREATE TABLE b (id INT NOT NULL, extra INT NOT NULL);",
        );
        let diff = SchemaDiff::generate(&current, &desired, &SyncConfig::default());
        let statements = MigrationGenerator::new().plan(&diff, &desired);

        assert!(statements[0].starts_with("CREATE TABLE `a`"));
        assert!(statements[1].starts_with("ALTER TABLE `b`"));
    }

    #[test]
    fn primary_key_drop_and_add_use_dedicated_forms() {
        let current = parse("CREATE TABLE t (id INT NOT NULL, PRIMARY KEY (id));");
        let desired =
            parse("CREATE TABLE t (id INT NOT NULL, other INT NOT NULL, PRIMARY KEY (id, other));");
        let diff = SchemaDiff::generate(&current, &desired, &SyncConfig::default());
        let statements =
            MigrationGenerator::new().alter_table_sql("t", &diff.tables_to_alter["t"]);

        assert!(statements.contains(&"ALTER TABLE `t` DROP PRIMARY KEY;".to_string()));
        assert!(statements
            .contains(&"ALTER TABLE `t` ADD PRIMARY KEY (`id`,`other`);".to_string()));
    }

    #[test]
    fn normalized_ddl_hides_formatting_differences() {
        let a = normalize_ddl(
            "-- header\nCREATE TABLE `t` (\n  `id` INT NOT NULL\n) ENGINE=InnoDB;",
        )
        .unwrap();
        let b = normalize_ddl("create table `t`(`id` int not null) engine = innodb;").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn normalized_ddl_preserves_quoted_case() {
        let a = normalize_ddl("CREATE TABLE t (a varchar(8) DEFAULT 'ABC');").unwrap();
        let b = normalize_ddl("CREATE TABLE t (a varchar(8) DEFAULT 'abc');").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn normalized_ddl_skips_boilerplate_statements() {
        let a = normalize_ddl(
            "SET NAMES utf8mb4;\nDROP TABLE IF EXISTS `t`;\nCREATE TABLE t (id int not null);",
        )
        .unwrap();
        let b = normalize_ddl("CREATE TABLE t (id INT NOT NULL);").unwrap();
        assert_eq!(a, b);
    }
}
