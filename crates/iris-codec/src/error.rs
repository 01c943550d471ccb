//! Codec error types.

use iris_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while framing messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete message arrived.
    #[error("connection closed mid-message")]
    ConnectionClosed,

    /// A header declared a payload larger than the configured limit.
    #[error("message too large: {size} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Declared payload size.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// The frame could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl CodecError {
    /// Whether the transport is unusable after this error.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}
