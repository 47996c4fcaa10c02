//! `RPL_ISUPPORT` (005) negotiation.
//!
//! [`ServerSupport`] starts out with conservative defaults and is updated
//! one 005 line at a time. Applying the same line twice leaves it unchanged,
//! unknown keys are ignored and malformed values never cause an error.
//!
//! # Reference
//! - <https://modern.ircdocs.horse/#rplisupport-005>

use std::collections::BTreeMap;

use tracing::trace;

/// How a channel mode letter consumes parameters, after `CHANMODES` and `PREFIX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeClass {
    /// Type A: list mode, always takes a parameter (e.g. `b`).
    List,
    /// Type B: always takes a parameter (e.g. `k`).
    Always,
    /// Type C: takes a parameter only when set (e.g. `l`).
    OnSet,
    /// Type D: never takes a parameter (e.g. `n`).
    Flag,
    /// Membership mode from `PREFIX` (e.g. `o`); the parameter is a nick.
    Membership,
}

/// The four `CHANMODES` groups.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelModes {
    /// List modes.
    pub a: String,
    /// Modes that always take a parameter.
    pub b: String,
    /// Modes that take a parameter when set.
    pub c: String,
    /// Parameterless modes.
    pub d: String,
}

impl ChannelModes {
    /// Parse a `CHANMODES` value like `beI,k,l,imnpst`. Missing groups are empty.
    pub fn parse(value: &str) -> Self {
        let mut groups = value.splitn(4, ',').map(str::to_string);
        Self {
            a: groups.next().unwrap_or_default(),
            b: groups.next().unwrap_or_default(),
            c: groups.next().unwrap_or_default(),
            d: groups.next().unwrap_or_default(),
        }
    }

    /// Class of a mode letter, ignoring `PREFIX`.
    pub fn class_of(&self, mode: char) -> Option<ModeClass> {
        if self.a.contains(mode) {
            Some(ModeClass::List)
        } else if self.b.contains(mode) {
            Some(ModeClass::Always)
        } else if self.c.contains(mode) {
            Some(ModeClass::OnSet)
        } else if self.d.contains(mode) {
            Some(ModeClass::Flag)
        } else {
            None
        }
    }
}

impl Default for ChannelModes {
    fn default() -> Self {
        Self::parse("beI,k,l,imnpst")
    }
}

/// The `PREFIX` table: membership modes and their symbols, highest rank first.
///
/// ```
/// use chatmux_proto::isupport::PrefixMap;
///
/// let prefix = PrefixMap::parse("(qaohv)~&@%+").unwrap();
/// assert_eq!(prefix.symbol_for('o'), Some('@'));
/// assert_eq!(prefix.mode_for('+'), Some('v'));
/// assert_eq!(prefix.split_nick("@%alice"), ("@%", "alice"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixMap {
    pairs: Vec<(char, char)>,
}

impl PrefixMap {
    /// Parse a `PREFIX` value like `(ov)@+`. An empty value means no prefixes.
    ///
    /// Returns `None` if the value is malformed or the two halves differ in length.
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            return Some(Self { pairs: Vec::new() });
        }
        let rest = value.strip_prefix('(')?;
        let (modes, symbols) = rest.split_once(')')?;
        if modes.chars().count() != symbols.chars().count() {
            return None;
        }
        Some(Self {
            pairs: modes.chars().zip(symbols.chars()).collect(),
        })
    }

    /// Symbol for a membership mode.
    pub fn symbol_for(&self, mode: char) -> Option<char> {
        self.pairs.iter().find(|(m, _)| *m == mode).map(|(_, s)| *s)
    }

    /// Membership mode for a symbol.
    pub fn mode_for(&self, symbol: char) -> Option<char> {
        self.pairs.iter().find(|(_, s)| *s == symbol).map(|(m, _)| *m)
    }

    /// Returns true if `c` is a membership mode letter.
    pub fn is_mode(&self, c: char) -> bool {
        self.symbol_for(c).is_some()
    }

    /// Split leading membership symbols off a `RPL_NAMREPLY` entry.
    pub fn split_nick<'a>(&self, entry: &'a str) -> (&'a str, &'a str) {
        let start = entry
            .char_indices()
            .find(|&(_, c)| self.mode_for(c).is_none())
            .map_or(entry.len(), |(i, _)| i);
        entry.split_at(start)
    }

    /// Add `symbol` to a membership prefix string, keeping rank order.
    pub fn add_symbol(&self, current: &str, symbol: char) -> String {
        self.pairs
            .iter()
            .map(|(_, s)| *s)
            .filter(|s| *s == symbol || current.contains(*s))
            .collect()
    }

    /// Remove `symbol` from a membership prefix string.
    pub fn remove_symbol(&self, current: &str, symbol: char) -> String {
        current.chars().filter(|c| *c != symbol).collect()
    }

    /// Iterate over `(mode, symbol)` pairs, highest rank first.
    pub fn iter(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.pairs.iter().copied()
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self {
            pairs: vec![('o', '@'), ('v', '+')],
        }
    }
}

/// Channel-related limits.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSupport {
    /// `IDCHAN`: channel prefix → id length.
    pub idlength: BTreeMap<String, u32>,
    /// `CHANNELLEN`.
    pub length: u32,
    /// `CHANLIMIT`: channel prefixes → how many may be joined.
    pub limit: BTreeMap<String, u32>,
    /// `CHANMODES`.
    pub modes: ChannelModes,
    /// `CHANTYPES`.
    pub types: String,
}

impl Default for ChannelSupport {
    fn default() -> Self {
        Self {
            idlength: BTreeMap::new(),
            length: 200,
            limit: BTreeMap::new(),
            modes: ChannelModes::default(),
            types: "&#".to_string(),
        }
    }
}

/// Negotiated server limits and features.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerSupport {
    /// Channel limits.
    pub channel: ChannelSupport,
    /// `KICKLEN`.
    pub kicklength: Option<u32>,
    /// `TOPICLEN`.
    pub topiclength: Option<u32>,
    /// `NICKLEN`.
    pub nicklength: u32,
    /// `MAXLIST`: list modes → maximum entries.
    pub maxlist: BTreeMap<String, u32>,
    /// `TARGMAX` (command → count).
    pub maxtargets: BTreeMap<String, u32>,
    /// `MAXTARGETS`: the limit for commands `TARGMAX` does not list.
    pub maxtargets_default: Option<u32>,
    /// `MODES`: mode changes per MODE command.
    pub modes: u32,
    /// `PREFIX`.
    pub prefix: PrefixMap,
    /// `NETWORK`.
    pub network: Option<String>,
    /// `CASEMAPPING`.
    pub casemapping: Option<String>,
}

impl Default for ServerSupport {
    fn default() -> Self {
        Self {
            channel: ChannelSupport::default(),
            kicklength: None,
            topiclength: None,
            nicklength: 9,
            maxlist: BTreeMap::new(),
            maxtargets: BTreeMap::new(),
            maxtargets_default: None,
            modes: 3,
            prefix: PrefixMap::default(),
            network: None,
            casemapping: None,
        }
    }
}

impl ServerSupport {
    /// Apply the parameters of one `RPL_ISUPPORT` message.
    ///
    /// The first parameter (our nick) and a trailing human-readable text are skipped.
    ///
    /// ```
    /// use chatmux_proto::isupport::ServerSupport;
    ///
    /// let mut support = ServerSupport::default();
    /// support.apply_params(&["alice", "NICKLEN=30", "CHANTYPES=#", "are supported by this server"]);
    /// assert_eq!(support.nicklength, 30);
    /// assert_eq!(support.channel.types, "#");
    /// ```
    pub fn apply_params<S: AsRef<str>>(&mut self, params: &[S]) {
        let mut tokens = params.get(1..).unwrap_or_default();
        if let Some(last) = tokens.last() {
            if last.as_ref().contains(char::is_whitespace) {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        for token in tokens {
            self.apply_token(token.as_ref());
        }
    }

    /// Apply a single `KEY=VALUE` token. Tokens without `=` are ignored.
    pub fn apply_token(&mut self, token: &str) {
        let Some((key, value)) = token.split_once('=') else {
            trace!(token, "isupport token without value ignored");
            return;
        };

        match key.to_ascii_uppercase().as_str() {
            "CHANLIMIT" => self.channel.limit = parse_sublist(value),
            "CHANMODES" => self.channel.modes = ChannelModes::parse(value),
            "CHANTYPES" => self.channel.types = value.to_string(),
            "CHANNELLEN" => set_number(&mut self.channel.length, value),
            "IDCHAN" => self.channel.idlength = parse_sublist(value),
            "KICKLEN" => set_optional_number(&mut self.kicklength, value),
            "TOPICLEN" => set_optional_number(&mut self.topiclength, value),
            "NICKLEN" => set_number(&mut self.nicklength, value),
            "MAXLIST" => self.maxlist = parse_sublist(value),
            "TARGMAX" => self.maxtargets = parse_sublist(value),
            "MAXTARGETS" => set_optional_number(&mut self.maxtargets_default, value),
            "MODES" => set_number(&mut self.modes, value),
            "PREFIX" => match PrefixMap::parse(value) {
                Some(prefix) => self.prefix = prefix,
                None => trace!(value, "malformed PREFIX ignored"),
            },
            "NETWORK" => self.network = Some(value.to_string()),
            "CASEMAPPING" => self.casemapping = Some(value.to_ascii_lowercase()),
            _ => trace!(key, "unhandled isupport key"),
        }
    }

    /// Returns true if `name` starts with one of the advertised channel types.
    pub fn is_channel(&self, name: &str) -> bool {
        name.chars()
            .next()
            .is_some_and(|c| self.channel.types.contains(c))
    }

    /// Class of a channel mode letter. Membership modes take precedence.
    pub fn mode_class(&self, mode: char) -> Option<ModeClass> {
        if self.prefix.is_mode(mode) {
            return Some(ModeClass::Membership);
        }
        self.channel.modes.class_of(mode)
    }

    /// Maximum targets for `command`, falling back to a bare `MAXTARGETS`.
    pub fn max_targets(&self, command: &str) -> Option<u32> {
        self.maxtargets
            .get(&command.to_ascii_uppercase())
            .copied()
            .or(self.maxtargets_default)
    }
}

/// Parse a `NAME:NUMBER,NAME:NUMBER` list. A missing number counts as 0.
fn parse_sublist(value: &str) -> BTreeMap<String, u32> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(':') {
            Some((name, n)) => (name.to_string(), n.parse().unwrap_or(0)),
            None => (item.to_string(), 0),
        })
        .collect()
}

fn set_number(slot: &mut u32, value: &str) {
    if let Ok(n) = value.parse() {
        *slot = n;
    }
}

fn set_optional_number(slot: &mut Option<u32>, value: &str) {
    if let Ok(n) = value.parse() {
        *slot = Some(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(tokens: &[&str]) -> Vec<String> {
        let mut params = vec!["alice".to_string()];
        params.extend(tokens.iter().map(|t| t.to_string()));
        params.push("are supported by this server".to_string());
        params
    }

    #[test]
    fn test_defaults() {
        let support = ServerSupport::default();
        assert_eq!(support.channel.length, 200);
        assert_eq!(support.channel.types, "&#");
        assert_eq!(support.nicklength, 9);
        assert_eq!(support.modes, 3);
        assert_eq!(support.prefix.symbol_for('o'), Some('@'));
        assert_eq!(support.prefix.symbol_for('v'), Some('+'));
    }

    #[test]
    fn test_apply_full_line() {
        let mut support = ServerSupport::default();
        support.apply_params(&line(&[
            "CHANLIMIT=#&:100,+:",
            "CHANMODES=eIbq,k,flj,CFLMPQScgimnprstz",
            "CHANNELLEN=64",
            "IDCHAN=!:5",
            "KICKLEN=255",
            "MAXLIST=bqeI:100",
            "MODES=4",
            "NETWORK=Libera.Chat",
            "NICKLEN=16",
            "PREFIX=(qov)~@+",
            "TOPICLEN=390",
            "TARGMAX=NAMES:1,PRIVMSG:4,JOIN:",
            "CASEMAPPING=RFC1459",
        ]));

        assert_eq!(support.channel.limit.get("#&"), Some(&100));
        assert_eq!(support.channel.limit.get("+"), Some(&0));
        assert_eq!(support.channel.modes.a, "eIbq");
        assert_eq!(support.channel.modes.d, "CFLMPQScgimnprstz");
        assert_eq!(support.channel.length, 64);
        assert_eq!(support.channel.idlength.get("!"), Some(&5));
        assert_eq!(support.kicklength, Some(255));
        assert_eq!(support.maxlist.get("bqeI"), Some(&100));
        assert_eq!(support.modes, 4);
        assert_eq!(support.network.as_deref(), Some("Libera.Chat"));
        assert_eq!(support.nicklength, 16);
        assert_eq!(support.prefix.symbol_for('q'), Some('~'));
        assert_eq!(support.topiclength, Some(390));
        assert_eq!(support.max_targets("privmsg"), Some(4));
        assert_eq!(support.max_targets("JOIN"), Some(0));
        assert_eq!(support.casemapping.as_deref(), Some("rfc1459"));
    }

    #[test]
    fn test_idempotent() {
        let params = line(&["NICKLEN=9", "CHANTYPES=#", "PREFIX=(ov)@+"]);
        let mut once = ServerSupport::default();
        once.apply_params(&params);
        let mut twice = once.clone();
        twice.apply_params(&params);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ignores_bare_and_unknown_tokens() {
        let mut support = ServerSupport::default();
        support.apply_params(&line(&["EXCEPTS", "WHOX", "FOO=bar", "-NICKLEN", "NICKLEN=abc"]));
        assert_eq!(support, ServerSupport::default());
    }

    #[test]
    fn test_maxtargets_fallback() {
        let mut support = ServerSupport::default();
        support.apply_token("MAXTARGETS=4");
        assert_eq!(support.max_targets("NOTICE"), Some(4));
    }

    #[test]
    fn test_targmax_after_maxtargets_keeps_fallback() {
        let mut support = ServerSupport::default();
        support.apply_token("MAXTARGETS=4");
        support.apply_token("TARGMAX=PRIVMSG:2");
        assert_eq!(support.max_targets("PRIVMSG"), Some(2));
        assert_eq!(support.max_targets("NOTICE"), Some(4));

        let mut reversed = ServerSupport::default();
        reversed.apply_token("TARGMAX=PRIVMSG:2");
        reversed.apply_token("MAXTARGETS=4");
        assert_eq!(reversed, support);
    }

    #[test]
    fn test_malformed_prefix_keeps_previous() {
        let mut support = ServerSupport::default();
        support.apply_token("PREFIX=(ov)@");
        assert_eq!(support.prefix, PrefixMap::default());
        support.apply_token("PREFIX=");
        assert_eq!(support.prefix.symbol_for('o'), None);
    }

    #[test]
    fn test_mode_class() {
        let support = ServerSupport::default();
        assert_eq!(support.mode_class('o'), Some(ModeClass::Membership));
        assert_eq!(support.mode_class('b'), Some(ModeClass::List));
        assert_eq!(support.mode_class('k'), Some(ModeClass::Always));
        assert_eq!(support.mode_class('l'), Some(ModeClass::OnSet));
        assert_eq!(support.mode_class('n'), Some(ModeClass::Flag));
        assert_eq!(support.mode_class('Z'), None);
    }

    #[test]
    fn test_prefix_symbols() {
        let prefix = PrefixMap::parse("(ohv)@%+").unwrap();
        assert_eq!(prefix.split_nick("alice"), ("", "alice"));
        assert_eq!(prefix.split_nick("+bob"), ("+", "bob"));
        assert_eq!(prefix.add_symbol("+", '@'), "@+");
        assert_eq!(prefix.add_symbol("@+", '@'), "@+");
        assert_eq!(prefix.remove_symbol("@+", '@'), "+");
    }

    #[test]
    fn test_is_channel() {
        let support = ServerSupport::default();
        assert!(support.is_channel("#rust"));
        assert!(support.is_channel("&local"));
        assert!(!support.is_channel("alice"));
        assert!(!support.is_channel(""));
    }
}
