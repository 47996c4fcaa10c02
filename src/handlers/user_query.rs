//! WHOIS and WHO reply accumulation.
//!
//! Replies for a nick are collected into a [`WhoisRecord`] until the matching
//! end-of-list numeric, which emits [`Event::Whois`] and evicts the record.

use std::sync::Arc;

use chatmux_proto::{Message, irc_to_lower};
use tracing::debug;

use super::core::{Context, Handler, HandlerResult};
use super::helpers::{param, parse_timestamp};
use crate::event::Event;
use crate::state::WhoisRecord;

/// The WHOIS numerics that carry a single field each.
pub struct WhoisHandler;

impl Handler for WhoisHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = param(msg, 1)?;

        match msg.command.as_str() {
            "RPL_AWAY" => {
                // Also sent in reply to a PRIVMSG; only matters inside a WHOIS.
                if let Some(record) = ctx.state.client.whois.get_mut(&irc_to_lower(nick)) {
                    record.away = Some(param(msg, 2)?.to_string());
                }
            }
            "RPL_WHOISUSER" => {
                let user = param(msg, 2)?.to_string();
                let host = param(msg, 3)?.to_string();
                let realname = msg.trailing().filter(|_| msg.params.len() >= 6);
                let record = ctx.state.whois_entry(nick);
                record.nick = nick.to_string();
                record.user = Some(user);
                record.host = Some(host);
                record.realname = realname.map(str::to_string);
            }
            "RPL_WHOISSERVER" => {
                let server = param(msg, 2)?.to_string();
                let info = msg.param(3).map(str::to_string);
                let record = ctx.state.whois_entry(nick);
                record.server = Some(server);
                record.serverinfo = info;
            }
            "RPL_WHOISOPERATOR" => ctx.state.whois_entry(nick).operator = true,
            "RPL_WHOISIDLE" => {
                let idle = param(msg, 2)?.parse().ok();
                // The sign-on time is only present when a text parameter follows it.
                let signon = (msg.params.len() >= 5)
                    .then(|| msg.param(3).and_then(parse_timestamp))
                    .flatten();
                let record = ctx.state.whois_entry(nick);
                record.idle = idle;
                if signon.is_some() {
                    record.signon = signon;
                }
            }
            "RPL_WHOISCHANNELS" => {
                let channels = param(msg, 2)?;
                ctx.state
                    .whois_entry(nick)
                    .channels
                    .extend(channels.split_whitespace().map(str::to_string));
            }
            "RPL_WHOISACCOUNT" => {
                let account = param(msg, 2)?.to_string();
                ctx.state.whois_entry(nick).account = Some(account);
            }
            "RPL_WHOISSECURE" => ctx.state.whois_entry(nick).secure = true,
            _ => {}
        }
        Ok(())
    }
}

/// `RPL_ENDOFWHOIS <me> <nick>`.
pub struct EndOfWhoisHandler;

impl Handler for EndOfWhoisHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = param(msg, 1)?;
        match ctx.state.take_whois(nick) {
            Some(record) => ctx.emit(Event::Whois(record)),
            None => debug!(nick = %nick, "end of whois without replies"),
        }
        discard_stale(ctx);
        Ok(())
    }
}

/// `RPL_WHOREPLY <me> <channel> <user> <host> <server> <nick> <flags> :<hops> <realname>`.
///
/// Besides filling the record, updates the member's prefix when the channel is known.
pub struct WhoReplyHandler;

impl Handler for WhoReplyHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let channel = param(msg, 1)?;
        let user = param(msg, 2)?;
        let host = param(msg, 3)?;
        let server = param(msg, 4)?;
        let nick = param(msg, 5)?;
        let flags = param(msg, 6)?;
        let realname = msg
            .param(7)
            .map(|text| text.split_once(' ').map_or("", |(_, name)| name));

        ctx.state.client.who_batch.insert(irc_to_lower(nick));

        let record: &mut WhoisRecord = ctx.state.whois_entry(nick);
        record.nick = nick.to_string();
        record.user = Some(user.to_string());
        record.host = Some(host.to_string());
        record.server = Some(server.to_string());
        record.realname = realname.map(str::to_string);
        record.operator = flags.contains('*');
        if flags.starts_with('G') {
            record.away.get_or_insert_with(String::new);
        }

        let state = &mut *ctx.state;
        let symbols: String = flags
            .chars()
            .filter(|c| state.support.prefix.mode_for(*c).is_some())
            .collect();
        if let Some(channel) = state.channels.get_mut(&irc_to_lower(channel)) {
            if channel.has_member(nick) {
                channel.add_member(nick, &symbols);
            }
        }
        Ok(())
    }
}

/// `RPL_ENDOFWHO <me> <mask>`: emit every record the WHO listing filled.
pub struct EndOfWhoHandler;

impl Handler for EndOfWhoHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let mut batch: Vec<String> = std::mem::take(&mut ctx.state.client.who_batch)
            .into_iter()
            .collect();
        batch.sort();
        debug!(mask = msg.param(1).unwrap_or("*"), count = batch.len(), "end of who");
        for nick in batch {
            if let Some(record) = ctx.state.take_whois(&nick) {
                ctx.emit(Event::Whois(record));
            }
        }
        discard_stale(ctx);
        Ok(())
    }
}

fn discard_stale(ctx: &mut Context<'_>) {
    let stale = ctx.state.discard_whois();
    if stale > 0 {
        debug!(count = stale, "discarded whois records without an end reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::handlers::core::Effects;
    use crate::state::SessionState;

    fn run(handler: &dyn Handler, state: &mut SessionState, line: &str) -> Effects {
        let config = ClientConfig::new("irc.example.net", "me");
        let msg = Arc::new(line.parse::<Message>().unwrap());
        let mut ctx = Context::new(state, &config);
        handler.handle(&mut ctx, &msg).unwrap();
        ctx.into_effects()
    }

    #[test]
    fn test_whois_sequence() {
        let mut state = SessionState::new("me");
        for line in [
            ":srv 311 me Bob bob host.example * :Bob Builder",
            ":srv 319 me Bob :@#rust +#tokio",
            ":srv 312 me Bob irc.example.net :Example server",
            ":srv 301 me Bob :gone fishing",
            ":srv 313 me Bob :is an IRC operator",
            ":srv 317 me Bob 42 1700000000 :seconds idle, signon time",
            ":srv 330 me Bob bobacct :is logged in as",
            ":srv 671 me Bob :is using a secure connection",
        ] {
            assert!(run(&WhoisHandler, &mut state, line).events.is_empty());
        }

        let effects = run(&EndOfWhoisHandler, &mut state, ":srv 318 me bob :End of /WHOIS list.");
        let record = match &effects.events[..] {
            [Event::Whois(record)] => record.clone(),
            other => panic!("unexpected events: {:?}", other),
        };

        assert_eq!(record.nick, "Bob");
        assert_eq!(record.user.as_deref(), Some("bob"));
        assert_eq!(record.host.as_deref(), Some("host.example"));
        assert_eq!(record.realname.as_deref(), Some("Bob Builder"));
        assert_eq!(record.channels, vec!["@#rust", "+#tokio"]);
        assert_eq!(record.server.as_deref(), Some("irc.example.net"));
        assert_eq!(record.serverinfo.as_deref(), Some("Example server"));
        assert_eq!(record.away.as_deref(), Some("gone fishing"));
        assert!(record.operator);
        assert_eq!(record.idle, Some(42));
        assert_eq!(record.signon.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(record.account.as_deref(), Some("bobacct"));
        assert!(record.secure);

        assert!(state.client.whois.is_empty());
    }

    #[test]
    fn test_end_reply_discards_unfinished_records() {
        let mut state = SessionState::new("me");
        run(&WhoisHandler, &mut state, ":srv 311 me ghost g h * :Never ended");
        run(&WhoisHandler, &mut state, ":srv 311 me bob b h * :Bob");

        let effects = run(&EndOfWhoisHandler, &mut state, ":srv 318 me bob :End of /WHOIS list.");
        assert!(matches!(&effects.events[..], [Event::Whois(record)] if record.nick == "bob"));
        assert!(state.client.whois.is_empty());

        run(&WhoisHandler, &mut state, ":srv 311 me ghost g h * :Never ended");
        run(&WhoReplyHandler, &mut state, ":srv 352 me #c carol h srv carol H :0 Carol");
        let effects = run(&EndOfWhoHandler, &mut state, ":srv 315 me #c :End of /WHO list.");
        assert_eq!(effects.events.len(), 1);
        assert!(state.client.whois.is_empty());
    }

    #[test]
    fn test_away_outside_whois_is_ignored() {
        let mut state = SessionState::new("me");
        run(&WhoisHandler, &mut state, ":srv 301 me bob :away");
        assert!(state.client.whois.is_empty());
    }

    #[test]
    fn test_end_of_whois_without_record() {
        let mut state = SessionState::new("me");
        let effects = run(&EndOfWhoisHandler, &mut state, ":srv 318 me ghost :End of /WHOIS list.");
        assert!(effects.events.is_empty());
    }

    #[test]
    fn test_who_listing() {
        let mut state = SessionState::new("me");
        state.ensure_channel("#c").add_member("bob", "");

        run(&WhoReplyHandler, &mut state, ":srv 352 me #c bob h1 srv bob G*@ :0 Bob B");
        run(&WhoReplyHandler, &mut state, ":srv 352 me #c carol h2 srv carol H :3 Carol");
        let effects = run(&EndOfWhoHandler, &mut state, ":srv 315 me #c :End of /WHO list.");

        let records: Vec<&WhoisRecord> = effects
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Whois(record) => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nick, "bob");
        assert!(records[0].operator);
        assert_eq!(records[0].away.as_deref(), Some(""));
        assert_eq!(records[0].realname.as_deref(), Some("Bob B"));
        assert_eq!(records[1].nick, "carol");
        assert!(records[1].away.is_none());

        assert_eq!(state.channel("#c").unwrap().member("bob").unwrap().prefix, "@");
        assert!(!state.channel("#c").unwrap().has_member("carol"));
        assert!(state.client.who_batch.is_empty());
        assert!(state.client.whois.is_empty());
    }
}
