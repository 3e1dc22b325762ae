//! Error types for lotledger-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lotledger-core
#[derive(Debug, Error)]
pub enum Error {
    /// Field name is empty or whitespace
    #[error("Field name must not be empty")]
    EmptyFieldName,

    /// Name collides with a built-in vehicle attribute
    #[error("Field name is reserved for a vehicle attribute: {0}")]
    ReservedFieldName(String),

    /// Another field already uses this name
    #[error("Field name already exists: {0}")]
    DuplicateFieldName(String),

    /// Formula field saved without a formula
    #[error("Formula field '{0}' has no formula")]
    MissingFormula(String),

    /// Select field saved without any options
    #[error("Select field '{0}' has no options")]
    MissingOptions(String),

    /// Formula failed authoring-time validation
    #[error("Invalid formula for field '{field}': {message}")]
    InvalidFormula { field: String, message: String },

    /// Saving the field would make formula fields depend on each other in a loop
    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    /// Field not found by id or name
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
