//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while encoding or decoding IRIS wire structures.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The buffer ended before a complete structure could be read.
    #[error("buffer truncated: need {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required to continue decoding.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// An extended-form list item declared an impossible length.
    #[error("invalid list item length prefix: {0}")]
    InvalidLength(u32),

    /// An integer body does not fit in 64 bits.
    #[error("integer body of {0} bytes does not fit in 64 bits")]
    IntegerOverflow(usize),

    /// A textual item could not be interpreted as a number.
    #[error("invalid numeric text: {0:?}")]
    InvalidNumber(String),

    /// A wide string item had an odd byte count or unpaired surrogates.
    #[error("invalid UTF-16 string data")]
    InvalidUtf16,

    /// A float cannot be represented with the decimal exponent table.
    #[error("float {0} cannot be encoded as a scaled decimal")]
    FloatOutOfRange(f64),

    /// A list item body exceeds the largest encodable size.
    #[error("list item body of {0} bytes is too large")]
    ItemTooLarge(usize),

    /// An item had a tag that is not valid for the requested read.
    #[error("unexpected list item type {actual} while reading {expected}")]
    UnexpectedItemType {
        /// What the caller was trying to read.
        expected: &'static str,
        /// Raw tag found on the wire.
        actual: u8,
    },

    /// A header carried an opcode this implementation does not know.
    #[error("unknown opcode {0:02x?}")]
    UnknownOpcode([u8; 2]),
}

impl ProtocolError {
    /// Shorthand for a truncation error.
    #[must_use]
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }
}
