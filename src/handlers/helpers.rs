//! Parameter access helpers shared by the handlers.

use chatmux_proto::Message;

use super::core::HandlerError;

/// Parameter `index`, or `NeedMoreParams` if the message is too short.
pub fn param(msg: &Message, index: usize) -> Result<&str, HandlerError> {
    msg.param(index).ok_or_else(|| HandlerError::NeedMoreParams {
        command: msg.command.clone(),
        expected: index + 1,
        got: msg.params.len(),
    })
}

/// Nickname of the sender, or `NoOrigin` for server-originated messages.
pub fn source_nick(msg: &Message) -> Result<&str, HandlerError> {
    msg.source_nickname()
        .ok_or_else(|| HandlerError::NoOrigin(msg.command.clone()))
}

/// Seconds since the epoch as a UTC timestamp; garbage yields `None`.
pub fn parse_timestamp(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
}
