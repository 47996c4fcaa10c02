//! Channel-related types and state.

use std::collections::BTreeMap;

use chatmux_proto::isupport::ModeClass;
use chatmux_proto::{ServerSupport, irc_to_lower};
use chrono::{DateTime, Utc};

/// A channel member as last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Nickname, in the spelling the server last used.
    pub nick: String,
    /// Membership symbols (e.g. `"@"`, `"@+"`), highest rank first. Empty for none.
    pub prefix: String,
}

/// Everything known about one joined channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub topic: Option<String>,
    pub topic_setter: Option<String>,
    pub topic_time: Option<DateTime<Utc>>,
    /// Active flag and parameter modes, without a leading `+` (e.g. `"ntk"`).
    pub modes: String,
    /// Parameters of parameter modes and entries of list modes.
    pub mode_params: BTreeMap<char, Vec<String>>,
    pub created: Option<DateTime<Utc>>,
    /// Members keyed by case-folded nick.
    members: BTreeMap<String, Member>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic: None,
            topic_setter: None,
            topic_time: None,
            modes: String::new(),
            mode_params: BTreeMap::new(),
            created: None,
            members: BTreeMap::new(),
        }
    }

    /// Add a member, or update the prefix of an existing one.
    pub fn add_member(&mut self, nick: &str, prefix: &str) {
        let member = self
            .members
            .entry(irc_to_lower(nick))
            .or_insert_with(|| Member {
                nick: nick.to_string(),
                prefix: String::new(),
            });
        member.nick = nick.to_string();
        member.prefix = prefix.to_string();
    }

    pub fn remove_member(&mut self, nick: &str) -> Option<Member> {
        self.members.remove(&irc_to_lower(nick))
    }

    /// Rename a member, keeping its prefix. Returns false if `old` is not here.
    pub fn rename_member(&mut self, old: &str, new: &str) -> bool {
        match self.members.remove(&irc_to_lower(old)) {
            Some(mut member) => {
                member.nick = new.to_string();
                self.members.insert(irc_to_lower(new), member);
                true
            }
            None => false,
        }
    }

    pub fn member(&self, nick: &str) -> Option<&Member> {
        self.members.get(&irc_to_lower(nick))
    }

    pub fn has_member(&self, nick: &str) -> bool {
        self.member(nick).is_some()
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Member nicks in case-folded order.
    pub fn member_nicks(&self) -> Vec<String> {
        self.members.values().map(|m| m.nick.clone()).collect()
    }

    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Replace the channel modes with a `RPL_CHANNELMODEIS` mode string.
    pub fn set_modes(&mut self, modes: &str, args: &[String], support: &ServerSupport) {
        self.modes.clear();
        self.mode_params
            .retain(|mode, _| support.mode_class(*mode) == Some(ModeClass::List));
        self.apply_modes(modes, args, support);
    }

    /// Apply a `+/-` mode change string with its arguments.
    ///
    /// Arguments are consumed according to the `CHANMODES` class of each
    /// letter; membership modes update member prefixes. A change whose
    /// argument is missing is skipped. Unknown letters are treated as flags.
    pub fn apply_modes(&mut self, modes: &str, args: &[String], support: &ServerSupport) {
        let mut adding = true;
        let mut args = args.iter();

        for mode in modes.chars() {
            match mode {
                '+' => adding = true,
                '-' => adding = false,
                _ => match support.mode_class(mode).unwrap_or(ModeClass::Flag) {
                    ModeClass::Membership => {
                        let Some(nick) = args.next() else { continue };
                        let Some(symbol) = support.prefix.symbol_for(mode) else {
                            continue;
                        };
                        if let Some(member) = self.members.get_mut(&irc_to_lower(nick)) {
                            member.prefix = if adding {
                                support.prefix.add_symbol(&member.prefix, symbol)
                            } else {
                                support.prefix.remove_symbol(&member.prefix, symbol)
                            };
                        }
                    }
                    ModeClass::List => {
                        let Some(mask) = args.next() else { continue };
                        let list = self.mode_params.entry(mode).or_default();
                        if adding {
                            if !list.contains(mask) {
                                list.push(mask.clone());
                            }
                        } else {
                            list.retain(|m| m != mask);
                            if list.is_empty() {
                                self.mode_params.remove(&mode);
                            }
                        }
                    }
                    ModeClass::Always => {
                        let Some(arg) = args.next() else { continue };
                        if adding {
                            self.set_flag(mode);
                            self.mode_params.insert(mode, vec![arg.clone()]);
                        } else {
                            self.clear_flag(mode);
                        }
                    }
                    ModeClass::OnSet => {
                        if adding {
                            let Some(arg) = args.next() else { continue };
                            self.set_flag(mode);
                            self.mode_params.insert(mode, vec![arg.clone()]);
                        } else {
                            self.clear_flag(mode);
                        }
                    }
                    ModeClass::Flag => {
                        if adding {
                            self.set_flag(mode);
                        } else {
                            self.clear_flag(mode);
                        }
                    }
                },
            }
        }
    }

    fn set_flag(&mut self, mode: char) {
        if !self.modes.contains(mode) {
            self.modes.push(mode);
        }
    }

    fn clear_flag(&mut self, mode: char) {
        self.modes.retain(|c| c != mode);
        self.mode_params.remove(&mode);
    }
}
