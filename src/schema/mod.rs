//! Schema module for mysqldiff
//!
//! This module handles schema parsing, introspection, comparison and DDL
//! generation.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod parser;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use diff::{ColumnChange, SchemaDiff, TableDelta};
pub use generator::MigrationGenerator;
pub use parser::DdlParser;
pub use types::{
    Column, ForeignKey, Index, ReferenceAction, Schema, Table, TableOptions, PRIMARY_KEY_NAME,
};
