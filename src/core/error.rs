//! Error types for XML mapping operations
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Error types for XML mapping operations
#[derive(Debug, Error)]
pub enum XmlMapError {
    /// Bad parameter provided to a function
    #[error("Bad parameter: {0}")]
    BadParam(String),

    /// Malformed or unresolvable path expression
    #[error("Bad XPath: {0}")]
    BadXPath(String),

    /// Assigned value cannot be represented in the field's declared type
    #[error("Field '{field}' expects {expected}, got '{value}'")]
    TypeCoercion {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// Assigned literal is not one of the field's allowed choices
    #[error("Field '{field}' does not allow '{value}' (choices: {})", .choices.join(", "))]
    ChoiceConstraint {
        field: String,
        value: String,
        choices: Vec<String>,
    },

    /// A required field is absent
    #[error("Required field '{field}' of '{schema}' is missing")]
    MissingRequiredField { schema: String, field: String },

    /// Parse error (XML parsing failed)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Remote resource could not be fetched
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

/// Result type alias for XML mapping operations
pub type XmlMapResult<T> = Result<T, XmlMapError>;
