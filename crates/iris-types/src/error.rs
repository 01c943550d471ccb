//! Type conversion error types.

use iris_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur during type conversion.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TypeError {
    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// Value has no wire representation.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// Invalid date/time value.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// The underlying list item could not be read.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
