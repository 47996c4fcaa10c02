//! Handler registry and dispatch.
//!
//! The `Registry` maps canonical command names to handlers and counts how
//! often each one ran.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chatmux_proto::Message;
use lazy_static::lazy_static;
use tracing::{Level, debug, span, warn};

use super::context::{Context, Effects, Handler, HandlerResult};
use crate::config::ClientConfig;
use crate::event::Event;
use crate::handlers::{
    channel::{
        ChannelModeIsHandler, CreationTimeHandler, EndOfNamesHandler, JoinHandler, KickHandler,
        NamReplyHandler, NoTopicHandler, PartHandler, RplTopicHandler, TopicHandler,
        TopicWhoTimeHandler,
    },
    connection::{
        ErrorHandler, KillHandler, NickHandler, NickInUseHandler, PingHandler, QuitHandler,
        WelcomeHandler,
    },
    messaging::PrivmsgHandler,
    mode::ModeHandler,
    server_query::{IsupportHandler, MotdHandler},
    user_query::{EndOfWhoHandler, EndOfWhoisHandler, WhoReplyHandler, WhoisHandler},
};
use crate::state::SessionState;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}

/// Registry of inbound-message handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    command_counts: HashMap<&'static str, AtomicU64>,
}

impl Registry {
    /// Create a registry with every handler registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection lifecycle
        handlers.insert("PING", Box::new(PingHandler));
        handlers.insert("RPL_WELCOME", Box::new(WelcomeHandler));
        handlers.insert("ERR_NICKNAMEINUSE", Box::new(NickInUseHandler));
        handlers.insert("NICK", Box::new(NickHandler));
        handlers.insert("QUIT", Box::new(QuitHandler));
        handlers.insert("KILL", Box::new(KillHandler));
        handlers.insert("ERROR", Box::new(ErrorHandler));

        // Channels
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("PART", Box::new(PartHandler));
        handlers.insert("KICK", Box::new(KickHandler));
        handlers.insert("TOPIC", Box::new(TopicHandler));
        handlers.insert("RPL_TOPIC", Box::new(RplTopicHandler));
        handlers.insert("RPL_NOTOPIC", Box::new(NoTopicHandler));
        handlers.insert("RPL_TOPICWHOTIME", Box::new(TopicWhoTimeHandler));
        handlers.insert("RPL_CHANNELMODEIS", Box::new(ChannelModeIsHandler));
        handlers.insert("RPL_CREATIONTIME", Box::new(CreationTimeHandler));
        handlers.insert("RPL_NAMREPLY", Box::new(NamReplyHandler));
        handlers.insert("RPL_ENDOFNAMES", Box::new(EndOfNamesHandler));
        handlers.insert("MODE", Box::new(ModeHandler));

        handlers.insert("PRIVMSG", Box::new(PrivmsgHandler));

        // WHOIS / WHO
        for name in [
            "RPL_AWAY",
            "RPL_WHOISUSER",
            "RPL_WHOISSERVER",
            "RPL_WHOISOPERATOR",
            "RPL_WHOISIDLE",
            "RPL_WHOISCHANNELS",
            "RPL_WHOISACCOUNT",
            "RPL_WHOISSECURE",
        ] {
            handlers.insert(name, Box::new(WhoisHandler));
        }
        handlers.insert("RPL_ENDOFWHOIS", Box::new(EndOfWhoisHandler));
        handlers.insert("RPL_WHOREPLY", Box::new(WhoReplyHandler));
        handlers.insert("RPL_ENDOFWHO", Box::new(EndOfWhoHandler));

        // Server information
        handlers.insert("RPL_ISUPPORT", Box::new(IsupportHandler));
        for name in ["RPL_MOTDSTART", "RPL_MOTD", "RPL_ENDOFMOTD", "ERR_NOMOTD"] {
            handlers.insert(name, Box::new(MotdHandler));
        }

        let command_counts = handlers
            .keys()
            .map(|&command| (command, AtomicU64::new(0)))
            .collect();

        Self {
            handlers,
            command_counts,
        }
    }

    /// Returns true if some handler reacts to `command`.
    pub fn handles(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// How often each handler ran, most used first. Unused handlers are left out.
    pub fn command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(command, count)| (*command, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Run the handler for `msg`, if there is one.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let command = msg.command.as_str();
        let Some(handler) = self.handlers.get(command) else {
            return Ok(());
        };
        if let Some(count) = self.command_counts.get(command) {
            count.fetch_add(1, Ordering::Relaxed);
        }

        let irc_span = span!(
            Level::DEBUG,
            "irc.inbound",
            command = %command,
            source = msg.source_nickname(),
            nick = %ctx.state.client.nick,
        );
        let _enter = irc_span.enter();

        let result = handler.handle(ctx, msg);
        if let Err(ref e) = result {
            debug!(command = %command, error = %e, "handler error");
        }
        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Apply one inbound message to `state` and collect what should happen next.
///
/// A handler error is logged and does not stop the session. The message
/// itself is always delivered as the last event.
pub fn process(state: &mut SessionState, config: &ClientConfig, msg: Arc<Message>) -> Effects {
    let mut ctx = Context::new(state, config);
    if let Err(e) = REGISTRY.dispatch(&mut ctx, &msg) {
        warn!(command = %msg.command, error = %e, raw = %msg.raw, "ignoring malformed message");
    }
    ctx.emit(Event::Message(msg));
    ctx.into_effects()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;

    fn feed(state: &mut SessionState, config: &ClientConfig, line: &str) -> Effects {
        process(state, config, Arc::new(line.parse().unwrap()))
    }

    #[test]
    fn test_every_message_is_delivered_last() {
        let config = ClientConfig::new("irc.example.net", "alice");
        let mut state = SessionState::new("alice");
        state.phase = Phase::Registering;

        let effects = feed(&mut state, &config, ":irc.example.net 001 alice :Welcome");
        let names: Vec<_> = effects.events.iter().map(Event::name).collect();
        assert_eq!(names, vec!["registered", "message"]);
        assert_eq!(state.phase, Phase::Connected);
    }

    #[test]
    fn test_unhandled_command_only_delivers_message() {
        let config = ClientConfig::new("irc.example.net", "alice");
        let mut state = SessionState::new("alice");

        let effects = feed(&mut state, &config, ":bob!b@h NOTICE alice :hi");
        assert!(effects.outbound.is_empty());
        assert!(matches!(&effects.events[..], [Event::Message(m)] if m.command == "NOTICE"));
    }

    #[test]
    fn test_handler_error_is_not_fatal() {
        let config = ClientConfig::new("irc.example.net", "alice");
        let mut state = SessionState::new("alice");

        let effects = feed(&mut state, &config, "PING");
        assert!(effects.outbound.is_empty());
        assert_eq!(effects.events.len(), 1);

        let effects = feed(&mut state, &config, "PING :again");
        assert_eq!(effects.outbound[0].params, vec!["again"]);
    }

    #[test]
    fn test_registered_names_are_canonical() {
        let registry = Registry::new();
        for name in registry.handlers.keys() {
            assert!(
                chatmux_proto::command::by_name(name).is_some(),
                "{} is not a known command",
                name
            );
        }
        assert!(registry.handles("RPL_WHOISIDLE"));
        assert!(!registry.handles("NOTICE"));
    }

    #[test]
    fn test_command_stats() {
        let registry = Registry::new();
        let config = ClientConfig::new("irc.example.net", "alice");
        let mut state = SessionState::new("alice");
        for line in ["PING :a", "PING :b", ":bob!b@h QUIT :bye"] {
            let mut ctx = Context::new(&mut state, &config);
            registry.dispatch(&mut ctx, &Arc::new(line.parse().unwrap())).unwrap();
        }
        assert_eq!(registry.command_stats(), vec![("PING", 2), ("QUIT", 1)]);
    }
}
