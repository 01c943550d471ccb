//! Session state tracking.
//!
//! ## State Transitions
//!
//! ```text
//! Disconnected -> Handshaking (TCP connected)
//! Handshaking -> Ready (handshake and login accepted)
//! Ready -> InTransaction (begin)
//! InTransaction -> Ready (commit or rollback)
//! any -> Poisoned (transport failure or undecodable response)
//! any -> Disconnected (close)
//! ```
//!
//! An SQL error reported by the server leaves the state unchanged.

use crate::error::Error;

/// Runtime state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No transport, or the session was closed.
    #[default]
    Disconnected,
    /// Transport open, handshake or login in progress.
    Handshaking,
    /// Logged in, no transaction open.
    Ready,
    /// Logged in with an explicit transaction open.
    InTransaction,
    /// A transport or protocol failure left the session unusable.
    Poisoned,
}

impl SessionState {
    /// Check if requests may be sent in this state.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ready | Self::InTransaction)
    }

    /// Check if an explicit transaction is open.
    #[must_use]
    pub fn is_in_transaction(&self) -> bool {
        matches!(self, Self::InTransaction)
    }

    /// The error an operation attempted in this state fails with, if any.
    pub(crate) fn check_usable(&self) -> Result<(), Error> {
        match self {
            Self::Ready | Self::InTransaction => Ok(()),
            Self::Poisoned => Err(Error::Poisoned),
            Self::Disconnected => Err(Error::ConnectionClosed),
            Self::Handshaking => Err(Error::misuse("session has not finished logging in")),
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Handshaking => "handshaking",
            Self::Ready => "ready",
            Self::InTransaction => "in transaction",
            Self::Poisoned => "poisoned",
        };
        f.write_str(name)
    }
}
