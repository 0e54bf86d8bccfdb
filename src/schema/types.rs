//! Type definitions for database schema objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::utils::naming::unescape_quoted;

/// Name under which a table's primary key is stored in `Table::indexes`.
pub const PRIMARY_KEY_NAME: &str = "PRIMARY";

/// Represents a complete database schema: tables keyed by name.
///
/// `BTreeMap` keeps iteration (and therefore generated DDL) ordered by
/// table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the schema
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Represents a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in definition order; order matters for `CREATE TABLE`
    /// output but not for diffing.
    pub columns: Vec<Column>,
    pub indexes: BTreeMap<String, Index>,
    pub foreign_keys: BTreeMap<String, ForeignKey>,
    pub options: TableOptions,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: BTreeMap::new(),
            foreign_keys: BTreeMap::new(),
            options: TableOptions::default(),
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Add an index to the table
    pub fn add_index(&mut self, index: Index) {
        self.indexes.insert(index.name.clone(), index);
    }

    /// Add a foreign key to the table
    pub fn add_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.insert(fk.name.clone(), fk);
    }

    /// The primary key index, when present.
    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.get(PRIMARY_KEY_NAME)
    }

    /// Check the structural invariants of a fully constructed table.
    ///
    /// Violations indicate a bug in whatever built the table (or
    /// contradictory input), so they surface as `InvariantViolation`.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate column `{}` in table `{}`",
                    column.name, self.name
                )));
            }
        }

        if let Some(pk) = self.indexes.get(PRIMARY_KEY_NAME) {
            if !pk.unique {
                return Err(Error::InvariantViolation(format!(
                    "primary key of table `{}` must be unique",
                    self.name
                )));
            }
        }

        for fk in self.foreign_keys.values() {
            if fk.columns.len() != fk.referenced_columns.len() {
                return Err(Error::InvariantViolation(format!(
                    "foreign key `{}` on table `{}` references {} columns with {} local columns",
                    fk.name,
                    self.name,
                    fk.referenced_columns.len(),
                    fk.columns.len()
                )));
            }
            for column in &fk.columns {
                if self.column(column).is_none() {
                    return Err(Error::InvariantViolation(format!(
                        "foreign key `{}` on table `{}` names missing column `{}`",
                        fk.name, self.name, column
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Represents a database column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Lower-cased base type with its parameter list, e.g. `varchar(128)`
    /// or `decimal(20,8)`.
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// Lower-cased; recognized value is `auto_increment` or empty.
    pub extra: String,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
}

impl Column {
    /// Create a new column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            default: None,
            extra: String::new(),
            comment: None,
            charset: None,
            collation: None,
        }
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set a default value for the column
    pub fn default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Mark the column auto-increment
    pub fn auto_increment(mut self) -> Self {
        self.extra = "auto_increment".to_string();
        self
    }

    /// Equality under normalization: type, nullability, default and extra
    /// are compared with representation differences suppressed.
    pub fn same_definition(&self, other: &Column) -> bool {
        normalize_type(&self.data_type) == normalize_type(&other.data_type)
            && self.nullable == other.nullable
            && normalize_default(self.default.as_deref())
                == normalize_default(other.default.as_deref())
            && self.extra == other.extra
    }
}

/// Represents an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub index_type: String,
    pub comment: Option<String>,
}

impl Index {
    /// Create a new index with the given name and columns
    pub fn new(name: &str, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.to_string(),
            columns,
            unique,
            index_type: "BTREE".to_string(),
            comment: None,
        }
    }

    /// Create the primary key index over the given columns
    pub fn primary(columns: Vec<String>) -> Self {
        Self::new(PRIMARY_KEY_NAME, columns, true)
    }

    /// Two indexes are interchangeable when their column sequence and
    /// uniqueness agree.
    pub fn same_definition(&self, other: &Index) -> bool {
        self.columns == other.columns && self.unique == other.unique
    }
}

/// Represents a foreign key constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_update: ReferenceAction,
    pub on_delete: ReferenceAction,
}

impl ForeignKey {
    pub fn same_definition(&self, other: &ForeignKey) -> bool {
        self.columns == other.columns
            && self.referenced_table == other.referenced_table
            && self.referenced_columns == other.referenced_columns
            && self.on_update == other.on_update
            && self.on_delete == other.on_delete
    }
}

/// Referential action for `ON UPDATE` / `ON DELETE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

impl ReferenceAction {
    /// The SQL rendering of the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferenceAction::Restrict => "RESTRICT",
            ReferenceAction::Cascade => "CASCADE",
            ReferenceAction::SetNull => "SET NULL",
            ReferenceAction::NoAction => "NO ACTION",
        }
    }

    /// Parse an action keyword, tolerating case and spacing variation.
    pub fn parse(value: &str) -> Option<Self> {
        let collapsed = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match collapsed.as_str() {
            "RESTRICT" => Some(ReferenceAction::Restrict),
            "CASCADE" => Some(ReferenceAction::Cascade),
            "SET NULL" => Some(ReferenceAction::SetNull),
            "NO ACTION" => Some(ReferenceAction::NoAction),
            _ => None,
        }
    }
}

/// Table-level options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {
    pub engine: String,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Captured for rendering; never diffed.
    pub auto_increment: Option<u64>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            engine: "InnoDB".to_string(),
            collation: None,
            comment: None,
            auto_increment: None,
        }
    }
}

/// Normalize a column type for comparison: lower-case, internal runs of
/// whitespace collapsed to one space, and no spacing inside or around the
/// parameter list (`decimal(20, 8)` becomes `decimal(20,8)`).
///
/// Display widths survive: `int(11)` stays distinct from `int`.
pub fn normalize_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let after = matches!(out.chars().last(), Some('(') | Some(','));
            let before = matches!(ch, '(' | ')' | ',');
            if !out.is_empty() && !after && !before {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// Normalize a default value for comparison.
///
/// Absent defaults, the literal `NULL` (any case) and the quoted word are
/// all the same thing: no default. Quoted values lose their quotes and
/// backslash escapes. The empty string stays the empty string, distinct
/// from absence. Numeric literals pass through as text.
pub fn normalize_default(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.eq_ignore_ascii_case("null") {
        return None;
    }
    if value.len() >= 2 {
        let first = value.chars().next()?;
        if (first == '\'' || first == '"') && value.ends_with(first) {
            return Some(unescape_quoted(&value[1..value.len() - 1]));
        }
    }
    Some(value.to_string())
}

/// Whether a column type holds character/binary data, for DEFAULT quoting.
pub fn is_string_type(data_type: &str) -> bool {
    let base = data_type
        .split('(')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    matches!(
        base.as_str(),
        "char"
            | "varchar"
            | "tinytext"
            | "text"
            | "mediumtext"
            | "longtext"
            | "enum"
            | "set"
            | "binary"
            | "varbinary"
            | "tinyblob"
            | "blob"
            | "mediumblob"
            | "longblob"
    )
}
