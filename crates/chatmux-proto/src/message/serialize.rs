//! Outbound line construction.

use crate::command;
use crate::error::{MessageParseError, ProtocolError, Result};

use super::types::Message;

/// Returns true if `param` has to be sent as a trailing (`:`-prefixed) parameter.
fn needs_colon(param: &str) -> bool {
    param.is_empty() || param.starts_with(':') || param.contains(char::is_whitespace)
}

fn check_control_chars(param: &str) -> Result<()> {
    match param.chars().find(|c| matches!(c, '\r' | '\n' | '\0')) {
        Some(c) => Err(ProtocolError::IllegalControlChar(c)),
        None => Ok(()),
    }
}

fn invalid(command: &str, cause: MessageParseError) -> ProtocolError {
    ProtocolError::InvalidMessage {
        string: command.to_string(),
        cause,
    }
}

/// Build a CRLF-terminated line from a command and its parameters.
///
/// Registered numeric names are written as their three-digit code. The last
/// parameter is prefixed with `:` when it is empty, starts with `:`, or
/// contains whitespace.
///
/// ```
/// use chatmux_proto::serialize;
///
/// assert_eq!(
///     serialize("PRIVMSG", &["#rust", "hello there"]).unwrap(),
///     "PRIVMSG #rust :hello there\r\n"
/// );
/// assert_eq!(serialize("NICK", &["alice"]).unwrap(), "NICK alice\r\n");
/// ```
///
/// # Errors
///
/// - [`ProtocolError::IllegalControlChar`] if any parameter contains CR, LF or NUL.
/// - [`MessageParseError::InvalidCommand`] for an empty or non-alphanumeric command.
/// - [`MessageParseError::InvalidArgument`] if a parameter other than the last
///   one could not survive the trip (empty, leading `:`, or embedded whitespace).
pub fn serialize<S: AsRef<str>>(command: &str, params: &[S]) -> Result<String> {
    if command.is_empty()
        || !command
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid(command, MessageParseError::InvalidCommand));
    }

    let token = match command::by_name(command) {
        Some(info) => info.wire_token(),
        None => command.to_ascii_uppercase(),
    };

    let mut line = String::with_capacity(
        token.len() + params.iter().map(|p| p.as_ref().len() + 2).sum::<usize>() + 2,
    );
    line.push_str(&token);

    let last = params.len().saturating_sub(1);
    for (i, param) in params.iter().enumerate() {
        let param = param.as_ref();
        check_control_chars(param)?;

        line.push(' ');
        if needs_colon(param) {
            if i != last {
                return Err(invalid(
                    command,
                    MessageParseError::InvalidArgument(param.to_string()),
                ));
            }
            line.push(':');
        }
        line.push_str(param);
    }

    line.push_str("\r\n");
    Ok(line)
}

impl Message {
    /// Re-serialize this message's command and parameters (without prefix).
    pub fn to_line(&self) -> Result<String> {
        serialize(&self.command, &self.params)
    }
}
