//! Client error types.

use iris_codec::CodecError;
use iris_protocol::ProtocolError;
use iris_types::TypeError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connection closed, either by the peer or by [`close`](crate::Client::close).
    #[error("connection closed")]
    ConnectionClosed,

    /// The TCP connect did not complete within the configured timeout.
    #[error("connection timed out")]
    ConnectTimeout,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected the credentials or namespace.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server reported an SQL error.
    #[error("SQL error {code}: {message}")]
    Sql {
        /// SQLCODE reported in the response status.
        code: i16,
        /// Message fetched from the server for that code.
        message: String,
    },

    /// A message or list item could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Framing failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A value could not be converted.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// The caller used the API in a way the session forbids.
    #[error("misuse: {0}")]
    Misuse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An earlier transport or decode failure left the session unusable.
    #[error("session is unusable after an earlier failure")]
    Poisoned,
}

impl Error {
    /// Check if this error is transient and may succeed on a new session.
    ///
    /// Nothing is retried internally; this only classifies.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectTimeout | Self::ConnectionClosed | Self::Io(_) => true,
            Self::Codec(e) => e.is_connection_lost(),
            _ => false,
        }
    }

    /// Check if the session must be discarded after this error.
    ///
    /// SQL errors, misuse and conversion errors leave the session usable.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::ConnectionClosed
                | Self::ConnectTimeout
                | Self::Io(_)
                | Self::Authentication(_)
                | Self::Protocol(_)
                | Self::Codec(_)
                | Self::Poisoned
        )
    }

    /// Check if this error indicates malformed data on the wire.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_) | Self::Codec(CodecError::Protocol(_) | CodecError::FrameTooLarge { .. })
        )
    }

    /// Get the SQLCODE if this is a server-reported SQL error.
    #[must_use]
    pub fn sql_code(&self) -> Option<i16> {
        match self {
            Self::Sql { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Check if this is an SQL error with a specific code.
    #[must_use]
    pub fn is_sql_error(&self, code: i16) -> bool {
        self.sql_code() == Some(code)
    }

    pub(crate) fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
