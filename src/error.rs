//! Error types for mysqldiff

use thiserror::Error;

/// Result type for mysqldiff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mysqldiff
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Introspection error: {0}")]
    IntrospectionError(String),

    #[error("Parse error at byte {offset}: {message}")]
    ParseError { offset: usize, message: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Execution error for `{statement}`: {source}")]
    ExecutionError {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl Error {
    /// Shorthand for a parse failure at a byte offset into the DDL input.
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::ParseError {
            offset,
            message: message.into(),
        }
    }
}

/// Convert TOML deserialization errors to mysqldiff errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
