//! Error types for SQLFAN

use thiserror::Error;

/// Core error type for SQLFAN operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlfanError {
    /// The session factory could not establish a session
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution or fetch failed
    #[error("Query error: {0}")]
    Query(String),

    /// Input rejected before reaching the database (e.g. empty table name)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl SqlfanError {
    /// The original message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::NotSupported(msg)
            | Self::Io(msg)
            | Self::Other(msg) => msg,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for SqlfanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for SQLFAN operations
pub type Result<T> = std::result::Result<T, SqlfanError>;
