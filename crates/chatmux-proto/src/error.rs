//! Error types for the wire layer.
//!
//! [`ProtocolError`] covers everything that can go wrong while turning bytes
//! into lines and lines into messages. [`MessageParseError`] is the per-line
//! cause carried inside [`ProtocolError::InvalidMessage`].

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured encoding label is not known to `encoding_rs`.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// A line (or a pending fragment) exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual length seen so far.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Illegal control character in an outbound parameter.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// Failed to parse or build an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The offending line (or command, for outbound messages).
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Command token matched neither a registered name nor a known numeric.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An argument could not be represented on the wire.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Parsing failed at a specific position.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Character position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

impl ProtocolError {
    /// Returns true if this error only concerns a single line.
    ///
    /// Line-local errors must not tear down a session; everything else
    /// (I/O, oversized fragments) means the byte stream can no longer be trusted.
    pub fn is_line_local(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidMessage { .. } | ProtocolError::IllegalControlChar(_)
        )
    }
}
