use std::fmt;

use crate::casemap::irc_eq;
use crate::command::{self, CommandKind};

/// The source of a message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// A user, from a `nick!user@host` style prefix.
    User {
        /// Nickname.
        nick: String,
        /// Username (ident), when the prefix carried one.
        user: Option<String>,
        /// Hostname, when the prefix carried one.
        host: Option<String>,
    },
    /// A server name.
    Server(String),
}

impl Origin {
    /// Parse a prefix (without the leading `:`).
    ///
    /// `nick!user@host` and `nick@host` become [`Origin::User`], as does a bare
    /// token made only of nickname characters. Anything else, in particular
    /// anything with a dot before the first `!`/`@`, is a server name.
    pub fn parse(prefix: &str) -> Self {
        let (name, rest) = match prefix.find(['!', '@']) {
            Some(pos) => (&prefix[..pos], Some(&prefix[pos..])),
            None => (prefix, None),
        };

        if !is_nick_shaped(name) {
            return Origin::Server(prefix.to_string());
        }

        let (user, host) = match rest {
            Some(rest) if rest.starts_with('!') => match rest[1..].split_once('@') {
                Some((user, host)) => (Some(user), Some(host)),
                None => (Some(&rest[1..]), None),
            },
            Some(rest) => (None, Some(&rest[1..])),
            None => (None, None),
        };

        Origin::User {
            nick: name.to_string(),
            user: user.filter(|u| !u.is_empty()).map(str::to_string),
            host: host.filter(|h| !h.is_empty()).map(str::to_string),
        }
    }

    /// The nickname, for user origins.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Origin::User { nick, .. } => Some(nick),
            Origin::Server(_) => None,
        }
    }

    /// The server name, for server origins.
    pub fn server(&self) -> Option<&str> {
        match self {
            Origin::Server(name) => Some(name),
            Origin::User { .. } => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Server(name) => f.write_str(name),
            Origin::User { nick, user, host } => {
                f.write_str(nick)?;
                if let Some(user) = user {
                    write!(f, "!{}", user)?;
                }
                if let Some(host) = host {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

fn is_nick_shaped(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '[' | ']' | '\\' | '`' | '^' | '{' | '}' | '|' | '~')
        })
}

/// One parsed protocol line.
///
/// ```
/// use chatmux_proto::{CommandKind, Message};
///
/// let msg: Message = ":irc.example.net 001 alice :Welcome".parse().unwrap();
/// assert_eq!(msg.command, "RPL_WELCOME");
/// assert_eq!(msg.kind, CommandKind::NumericResponse);
/// assert_eq!(msg.params, vec!["alice", "Welcome"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// The line as received, without its terminator.
    pub raw: String,
    /// Who sent it, if the line had a prefix.
    pub origin: Option<Origin>,
    /// Canonical uppercase command name.
    pub command: String,
    /// Registry classification of `command`.
    pub kind: CommandKind,
    /// Positional parameters; a trailing parameter is stored like any other.
    pub params: Vec<String>,
}

impl Message {
    /// Nickname of the sender, if it was a user.
    pub fn source_nickname(&self) -> Option<&str> {
        self.origin.as_ref().and_then(Origin::nick)
    }

    /// Parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The last parameter, usually the human-readable text.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Numeric code, for numeric replies.
    pub fn numeric(&self) -> Option<u16> {
        command::by_name(&self.command).and_then(|info| info.numeric)
    }

    /// Returns true for `ERR_*` numerics.
    pub fn is_error(&self) -> bool {
        self.kind == CommandKind::NumericError
    }

    /// Returns true if the sender's nick equals `nick` after case-folding.
    pub fn is_from(&self, nick: &str) -> bool {
        self.source_nickname().is_some_and(|n| irc_eq(n, nick))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_full_user() {
        let origin = Origin::parse("nick!user@host.example.com");
        assert_eq!(
            origin,
            Origin::User {
                nick: "nick".to_string(),
                user: Some("user".to_string()),
                host: Some("host.example.com".to_string()),
            }
        );
        assert_eq!(origin.to_string(), "nick!user@host.example.com");
    }

    #[test]
    fn test_origin_server() {
        let origin = Origin::parse("irc.example.net");
        assert_eq!(origin, Origin::Server("irc.example.net".to_string()));
        assert_eq!(origin.server(), Some("irc.example.net"));
        assert_eq!(origin.nick(), None);
    }

    #[test]
    fn test_origin_bare_nick() {
        let origin = Origin::parse("Guest[42]");
        assert_eq!(origin.nick(), Some("Guest[42]"));
    }

    #[test]
    fn test_origin_nick_at_host() {
        let origin = Origin::parse("nick@host");
        assert_eq!(
            origin,
            Origin::User {
                nick: "nick".to_string(),
                user: None,
                host: Some("host".to_string()),
            }
        );
    }

    #[test]
    fn test_origin_dotted_name_with_bang_is_server() {
        let origin = Origin::parse("services.net!x@y");
        assert!(matches!(origin, Origin::Server(_)));
    }
}
