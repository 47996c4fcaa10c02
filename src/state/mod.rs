//! Session state cache.
//!
//! [`SessionState`] is everything one connection knows: its phase, its own
//! bookkeeping, the channels it is in and the server's advertised limits.
//! It is mutated only by the session's reader task, through the handlers.

mod channel;
mod client;
mod whois;

use std::collections::HashMap;

use chatmux_proto::{ServerSupport, irc_eq, irc_to_lower};

pub use channel::{Channel, Member};
pub use client::{ClientState, Phase};
pub use whois::WhoisRecord;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub client: ClientState,
    /// Joined channels keyed by case-folded name.
    pub channels: HashMap<String, Channel>,
    pub support: ServerSupport,
    /// Bumped each time `connect()` starts a new transport.
    pub attempt: u64,
}

impl SessionState {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            phase: Phase::Disconnected,
            client: ClientState::new(nick),
            channels: HashMap::new(),
            support: ServerSupport::default(),
            attempt: 0,
        }
    }

    /// Forget everything learned from a previous connection. The phase is left alone.
    pub fn reset(&mut self, nick: &str) {
        self.client = ClientState::new(nick);
        self.channels.clear();
        self.support = ServerSupport::default();
    }

    /// Returns true if `nick` is our own nick.
    pub fn is_me(&self, nick: &str) -> bool {
        irc_eq(nick, &self.client.nick)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&irc_to_lower(name))
    }

    /// The record for `name`, created if we have none yet.
    pub fn ensure_channel(&mut self, name: &str) -> &mut Channel {
        self.channels
            .entry(irc_to_lower(name))
            .or_insert_with(|| Channel::new(name))
    }

    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        self.channels.remove(&irc_to_lower(name))
    }

    /// Remove `nick` from every channel. Returns the names of the channels it left.
    pub fn remove_member_everywhere(&mut self, nick: &str) -> Vec<String> {
        self.channels
            .values_mut()
            .filter_map(|channel| channel.remove_member(nick).map(|_| channel.name.clone()))
            .collect()
    }

    /// Rename `old` to `new` in every channel it is in.
    pub fn rename_member_everywhere(&mut self, old: &str, new: &str) {
        for channel in self.channels.values_mut() {
            channel.rename_member(old, new);
        }
    }

    /// The in-progress WHOIS record for `nick`, created on first use.
    pub fn whois_entry(&mut self, nick: &str) -> &mut WhoisRecord {
        self.client
            .whois
            .entry(irc_to_lower(nick))
            .or_insert_with(|| WhoisRecord::new(nick))
    }

    /// Remove and return the record for `nick`.
    pub fn take_whois(&mut self, nick: &str) -> Option<WhoisRecord> {
        self.client.whois.remove(&irc_to_lower(nick))
    }

    /// Drop every in-progress WHOIS/WHO record. Returns how many there were.
    ///
    /// Replies to one query arrive contiguously, so anything still pending
    /// once an end-of-list numeric was handled lost its end numeric.
    pub fn discard_whois(&mut self) -> usize {
        self.client.who_batch.clear();
        let stale = self.client.whois.len();
        self.client.whois.clear();
        stale
    }
}
