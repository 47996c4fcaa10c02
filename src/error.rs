//! Error types for the client core.
//!
//! [`ClientError`] is what session operations return. Per-line parse errors
//! never surface here: they are logged and emitted as
//! [`Event::Error`](crate::event::Event::Error) while the session keeps going.

use chatmux_proto::ProtocolError;
use thiserror::Error;

/// Errors returned by [`Client`](crate::client::Client) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The connection ended, or the server refused us, before `RPL_WELCOME`.
    #[error("registration failed: {0}")]
    Registration(String),

    /// No transport is open.
    #[error("not connected")]
    NotConnected,

    /// The session was torn down while the operation was waiting.
    #[error("connection closed")]
    Closed,

    #[error("tls error: {0}")]
    Tls(String),
}

impl ClientError {
    /// Short static label, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
            Self::Registration(_) => "registration",
            Self::NotConnected => "not_connected",
            Self::Closed => "closed",
            Self::Tls(_) => "tls",
        }
    }
}

/// Convenience alias.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
