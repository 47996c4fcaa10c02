//! WHOIS / WHO accumulation.

use chrono::{DateTime, Utc};

/// What the server told us about a user during one WHOIS (or WHO) sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
    pub nick: String,
    pub user: Option<String>,
    pub host: Option<String>,
    pub realname: Option<String>,
    /// Seconds idle (`RPL_WHOISIDLE`).
    pub idle: Option<u64>,
    /// Sign-on time, when the server includes it in `RPL_WHOISIDLE`.
    pub signon: Option<DateTime<Utc>>,
    /// Channels as listed by the server, membership symbols included.
    pub channels: Vec<String>,
    pub server: Option<String>,
    pub serverinfo: Option<String>,
    pub operator: bool,
    /// Away message, if the user is away.
    pub away: Option<String>,
    /// Services account (`RPL_WHOISACCOUNT`).
    pub account: Option<String>,
    /// Connected over TLS (`RPL_WHOISSECURE`).
    pub secure: bool,
}

impl WhoisRecord {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Self::default()
        }
    }
}
