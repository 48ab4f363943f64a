use sqlfan_core::SqlfanError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Error raised by a session, loader or input validation
    #[error(transparent)]
    Core(#[from] SqlfanError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Vision model failed: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Core(SqlfanError::Validation(message.into()))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Core(e) if e.is_validation())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => ServiceError::Io(io),
            _ => ServiceError::Parse { line, message },
        }
    }
}

impl From<calamine::Error> for ServiceError {
    fn from(err: calamine::Error) -> Self {
        match err {
            calamine::Error::Io(io) => ServiceError::Io(io),
            other => ServiceError::Spreadsheet(other.to_string()),
        }
    }
}
