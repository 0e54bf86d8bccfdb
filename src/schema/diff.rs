//! Schema difference calculator
//!
//! Compares a current and a desired schema and produces the structural
//! delta the generator turns into DDL. Table and column drops are never
//! produced here except for columns when explicitly enabled.

use std::collections::BTreeMap;

use crate::config::SyncConfig;
use crate::schema::types::{Column, ForeignKey, Index, Schema, Table};

/// Represents changes needed to bring the current schema to the desired one
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub tables_to_create: Vec<String>,
    pub tables_to_alter: BTreeMap<String, TableDelta>,
}

impl SchemaDiff {
    /// Generate a schema diff between the current and desired schemas
    pub fn generate(current: &Schema, desired: &Schema, config: &SyncConfig) -> Self {
        let mut diff = Self::default();

        for (name, desired_table) in &desired.tables {
            if config.table_ignored(name) {
                continue;
            }
            match current.tables.get(name) {
                None => diff.tables_to_create.push(name.clone()),
                Some(current_table) => {
                    let delta = TableDelta::generate(current_table, desired_table, config);
                    if !delta.is_empty() {
                        diff.tables_to_alter.insert(name.clone(), delta);
                    }
                }
            }
        }

        diff
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.tables_to_create.is_empty() && self.tables_to_alter.is_empty()
    }
}

/// Per-table delta
#[derive(Debug, Clone, Default)]
pub struct TableDelta {
    /// New columns in desired definition order.
    pub columns_to_add: Vec<Column>,
    pub columns_to_modify: Vec<ColumnChange>,
    /// Computed only when column removal is enabled.
    pub columns_to_drop: Vec<String>,
    pub indexes_to_add: BTreeMap<String, Index>,
    pub indexes_to_drop: Vec<String>,
    pub foreign_keys_to_add: BTreeMap<String, ForeignKey>,
    pub foreign_keys_to_drop: Vec<String>,
    pub option_changes: OptionChanges,
}

/// Represents a column change
#[derive(Debug, Clone)]
pub struct ColumnChange {
    pub name: String,
    pub current: Column,
    pub desired: Column,
}

/// Engine and collation are the only diffable table options.
#[derive(Debug, Clone, Default)]
pub struct OptionChanges {
    pub engine: Option<String>,
    pub collation: Option<String>,
}

impl OptionChanges {
    pub fn is_empty(&self) -> bool {
        self.engine.is_none() && self.collation.is_none()
    }
}

impl TableDelta {
    fn generate(current: &Table, desired: &Table, config: &SyncConfig) -> Self {
        let mut delta = Self::default();
        let table = desired.name.as_str();

        for column in &desired.columns {
            if config.column_ignored(table, &column.name) {
                continue;
            }
            match current.column(&column.name) {
                None => delta.columns_to_add.push(column.clone()),
                Some(existing) if !existing.same_definition(column) => {
                    delta.columns_to_modify.push(ColumnChange {
                        name: column.name.clone(),
                        current: existing.clone(),
                        desired: column.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if config.allow_column_removal {
            for column in &current.columns {
                if config.column_ignored(table, &column.name) {
                    continue;
                }
                if desired.column(&column.name).is_none() {
                    delta.columns_to_drop.push(column.name.clone());
                }
            }
        }

        for (name, index) in &desired.indexes {
            if index
                .columns
                .iter()
                .any(|c| config.column_ignored(table, c))
            {
                continue;
            }
            match current.indexes.get(name) {
                None => {
                    delta.indexes_to_add.insert(name.clone(), index.clone());
                }
                Some(existing) if !existing.same_definition(index) => {
                    // changed indexes are replaced: drop first, add after
                    delta.indexes_to_drop.push(name.clone());
                    delta.indexes_to_add.insert(name.clone(), index.clone());
                }
                Some(_) => {}
            }
        }

        for (name, fk) in &desired.foreign_keys {
            if fk.columns.iter().any(|c| config.column_ignored(table, c)) {
                continue;
            }
            match current.foreign_keys.get(name) {
                None => {
                    delta.foreign_keys_to_add.insert(name.clone(), fk.clone());
                }
                Some(existing) if !existing.same_definition(fk) => {
                    delta.foreign_keys_to_drop.push(name.clone());
                    delta.foreign_keys_to_add.insert(name.clone(), fk.clone());
                }
                Some(_) => {}
            }
        }

        // engine names are keywords, so compared case-insensitively;
        // collation only diffs when the desired side states one
        if !current
            .options
            .engine
            .eq_ignore_ascii_case(&desired.options.engine)
        {
            delta.option_changes.engine = Some(desired.options.engine.clone());
        }
        if let Some(collation) = &desired.options.collation {
            if current.options.collation.as_deref() != Some(collation.as_str()) {
                delta.option_changes.collation = Some(collation.clone());
            }
        }

        delta
    }

    pub fn is_empty(&self) -> bool {
        self.columns_to_add.is_empty()
            && self.columns_to_modify.is_empty()
            && self.columns_to_drop.is_empty()
            && self.indexes_to_add.is_empty()
            && self.indexes_to_drop.is_empty()
            && self.foreign_keys_to_add.is_empty()
            && self.foreign_keys_to_drop.is_empty()
            && self.option_changes.is_empty()
    }
}
