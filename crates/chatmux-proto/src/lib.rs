//! # chatmux-proto
//!
//! The RFC 2812 wire layer used by the `chatmux` client.
//!
//! ## Features
//!
//! - Byte-stream framing on `\r\n`, `\r` or `\n` with configurable text encoding
//! - Strict message parsing into canonical command names
//! - Escaping serializer for outbound lines
//! - Static numeric/command registry
//! - `RPL_ISUPPORT` negotiation
//! - Optional Tokio codec for `FramedRead` / `FramedWrite`

#![deny(clippy::all)]
#![warn(missing_docs)]

//! ## Quick Start
//!
//! ```rust
//! use chatmux_proto::{serialize, Message};
//!
//! let message: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(message.source_nickname(), Some("nick"));
//! assert_eq!(message.trailing(), Some("Hello!"));
//!
//! let line = serialize("PRIVMSG", &["#channel", "Hello back!"]).unwrap();
//! assert_eq!(line, "PRIVMSG #channel :Hello back!\r\n");
//! ```

pub mod casemap;
pub mod command;
pub mod error;
pub mod isupport;
pub mod line;
pub mod message;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::command::{CommandInfo, CommandKind};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::isupport::ServerSupport;
pub use self::line::{FrameSplitter, MAX_IRC_LINE_LEN};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{serialize, Message, Origin};
