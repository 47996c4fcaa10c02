//! Events delivered to subscribers of a [`Client`](crate::client::Client).

use std::sync::Arc;

use chatmux_proto::Message;

use crate::state::{Member, WhoisRecord};

/// Something that happened on a session.
///
/// Every parsed inbound line is delivered as [`Event::Message`], after any
/// more specific event its handler produced.
#[derive(Debug, Clone)]
pub enum Event {
    /// `RPL_WELCOME` arrived; the session is usable.
    Registered { nick: String },
    /// A parsed inbound line.
    Message(Arc<Message>),
    /// A `PRIVMSG` addressed to our own nick.
    PrivateMessage {
        from: String,
        text: String,
        message: Arc<Message>,
    },
    /// The full message of the day.
    Motd(String),
    /// `RPL_ENDOFNAMES` closed a member list.
    Names { channel: String, members: Vec<Member> },
    /// A WHOIS or WHO sequence for one nick finished.
    Whois(WhoisRecord),
    /// A line could not be parsed, or the server sent `ERROR`.
    Error(String),
    /// The transport closed. `requested` is true after `disconnect()`.
    Disconnected { requested: bool },
}

impl Event {
    /// Short name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Registered { .. } => "registered",
            Event::Message(_) => "message",
            Event::PrivateMessage { .. } => "private_message",
            Event::Motd(_) => "motd",
            Event::Names { .. } => "names",
            Event::Whois(_) => "whois",
            Event::Error(_) => "error",
            Event::Disconnected { .. } => "disconnected",
        }
    }
}
