//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Invariant violation (empty chain, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A persisted line could not be decoded
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord {
        /// Record kind ("block", "product", ...)
        kind: &'static str,
        /// What was wrong with the line
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a malformed-record error
    pub fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
