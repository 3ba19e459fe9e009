//! Error types for sketch operations

use std::fmt;

/// Errors that can occur during sketch operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Invalid parameter provided to sketch constructor or operation
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// Error during serialization
    SerializationError(String),

    /// Error during deserialization: malformed header, unsupported version,
    /// out-of-range count, or non-finite/unordered centroid data
    DeserializationError(String),

    /// Input ended before a complete record could be decoded
    ///
    /// Signaled distinctly from [`SketchError::DeserializationError`] so callers
    /// can tell "the bytes are wrong" apart from "there aren't enough bytes yet".
    UnexpectedEof(String),
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
            SketchError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SketchError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            SketchError::UnexpectedEof(msg) => write!(f, "unexpected end of input: {}", msg),
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias for sketch operations
pub type Result<T> = std::result::Result<T, SketchError>;
