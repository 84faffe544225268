//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for statement building, mapping, and execution
#[derive(Debug, Error)]
pub enum Error {
    /// Caller misuse, detected before any driver call
    #[error("Misuse: {0}")]
    Misuse(String),

    /// UPDATE requested with an empty field set
    #[error("Nothing to update: the field set is empty")]
    NothingToUpdate,

    /// `begin` called while a transaction is already open
    #[error("Transaction already open: commit or rollback it first")]
    TransactionOpen,

    /// `commit`/`rollback` called with no open transaction
    #[error("No transaction open")]
    NoTransaction,

    /// A result column or value could not be bound to the destination
    #[error("Mapping error on '{target}': {message}")]
    Mapping { target: String, message: String },

    /// The fetch destination or write source is not a supported record shape
    #[error("Unsupported record shape: {0}")]
    UnsupportedShape(String),

    /// Strict single-row fetch matched no row
    #[error("No matching row found")]
    NoRows,

    /// Record (de)serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Driver error, propagated verbatim
    #[error("Driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Create a caller-misuse error
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }

    /// Create a mapping error for a specific column or record type
    pub fn mapping(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Wrap a driver error without reinterpreting it
    pub fn driver(err: impl ToString) -> Self {
        Self::Driver(err.to_string())
    }

    /// Check if this is a no-matching-row error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is an empty-field-set update error
    pub fn is_nothing_to_update(&self) -> bool {
        matches!(self, Self::NothingToUpdate)
    }

    /// Check if this is a row-to-record mapping error
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }
}
