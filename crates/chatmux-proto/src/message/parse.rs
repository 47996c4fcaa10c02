//! Message parsing.
//!
//! The prefix and command token are recognised with nom; the parameter
//! section is split by hand because its only rule is "everything after a
//! standalone colon is one parameter".

use std::str::FromStr;

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::command;
use crate::error::{MessageParseError, ProtocolError};

use super::types::{Message, Origin};

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// Parse message prefix (the part after `:` and before the first whitespace).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c: char| !c.is_whitespace()))(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

/// Split the text after the command into parameters.
///
/// A colon at the start of the text, or directly after whitespace, starts the
/// trailing parameter: everything after it is kept verbatim.
fn split_params(rest: &str) -> SmallVec<[&str; 15]> {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();

    let marker = rest.char_indices().find(|&(i, c)| {
        c == ':' && (i == 0 || rest[..i].ends_with(char::is_whitespace))
    });

    match marker {
        Some((pos, _)) => {
            params.extend(rest[..pos].split_whitespace());
            params.push(&rest[pos + 1..]);
        }
        None => params.extend(rest.split_whitespace()),
    }

    params
}

/// Tokenize a line into `(prefix, command, params)`.
fn tokenize(line: &str) -> IResult<&str, (Option<&str>, &str)> {
    let (input, _) = whitespace(line)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = whitespace(input)?;
    let (input, command) = parse_command(input)?;
    Ok((input, (prefix, command)))
}

impl Message {
    /// Parse a single line. A trailing `\r\n`, `\r` or `\n` is ignored.
    ///
    /// # Errors
    ///
    /// Fails with [`MessageParseError::EmptyMessage`] on a blank line and
    /// [`MessageParseError::UnknownCommand`] when the command token is neither
    /// a registered name nor a known numeric.
    pub fn parse(s: &str) -> Result<Message, ProtocolError> {
        let line = s.trim_end_matches(['\r', '\n']);
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: line.to_string(),
            cause,
        };

        if line.trim().is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let (rest, (prefix, token)) = tokenize(line).map_err(|e| {
            let position = match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => line.len() - e.input.len(),
                nom::Err::Incomplete(_) => line.len(),
            };
            invalid(MessageParseError::ParseContext {
                position,
                context: "expected prefix or command".to_string(),
            })
        })?;

        let info = command::lookup(token).map_err(invalid)?;

        Ok(Message {
            raw: line.to_string(),
            origin: prefix.map(Origin::parse),
            command: info.name.to_string(),
            kind: info.kind,
            params: split_params(rest).into_iter().map(str::to_string).collect(),
        })
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Message::parse(s)
    }
}
