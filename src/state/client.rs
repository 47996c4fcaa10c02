//! Per-session client state.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::whois::WhoisRecord;

/// Where a session is in its lifecycle.
///
/// ```text
/// Disconnected ──connect()──▶ Connecting ──transport open──▶ Registering ──RPL_WELCOME──▶ Connected
///      ▲                                                                                    │
///      └──────────────────── stream end, fatal error or disconnect() ◀──────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    Connecting,
    Registering,
    Connected,
}

impl Phase {
    /// Connecting or Registering.
    pub fn is_pending(self) -> bool {
        matches!(self, Phase::Connecting | Phase::Registering)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Disconnected => "disconnected",
            Phase::Connecting => "connecting",
            Phase::Registering => "registering",
            Phase::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Session-level bookkeeping that is not tied to a channel.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// Our current nickname.
    pub nick: String,
    /// Set by `disconnect()` so the end of the stream is reported as requested.
    pub requested_disconnect: bool,
    /// MOTD lines collected since `RPL_MOTDSTART`.
    pub motd: Vec<String>,
    /// In-progress WHOIS/WHO records, keyed by case-folded nick.
    pub whois: HashMap<String, WhoisRecord>,
    /// How many alternative nicks registration has tried.
    pub nick_retries: u32,
    /// Nicks filled in by `RPL_WHOREPLY` since the last `RPL_ENDOFWHO`, case-folded.
    pub who_batch: HashSet<String>,
    /// Channels with a `RPL_NAMREPLY` listing in progress, case-folded.
    pub names_in_progress: HashSet<String>,
    /// Server name from the `RPL_WELCOME` prefix.
    pub server_name: Option<String>,
    /// Text of the last `ERROR` the server sent.
    pub last_error: Option<String>,
}

impl ClientState {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Self::default()
        }
    }
}
