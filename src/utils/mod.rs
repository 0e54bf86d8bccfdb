//! Utilities for mysqldiff
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{escape_string, foreign_key_name, quote_identifier};
