//! Channel membership and topic handlers.

use std::sync::Arc;

use chatmux_proto::{Message, irc_to_lower};
use chrono::Utc;
use tracing::{debug, info};

use super::core::{Context, Handler, HandlerResult};
use super::helpers::{param, parse_timestamp, source_nick};
use crate::event::Event;
use crate::state::Member;

/// `JOIN`: the first sighting of a channel creates its record; the joiner
/// becomes a member with no prefix.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = source_nick(msg)?;
        let name = param(msg, 0)?;

        if ctx.state.is_me(nick) {
            info!(channel = %name, "joined");
        }
        ctx.state.ensure_channel(name).add_member(nick, "");
        Ok(())
    }
}

/// `PART`: drop the member, or the whole record when we are the one leaving.
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = source_nick(msg)?;
        let targets = param(msg, 0)?;

        for name in targets.split(',').filter(|n| !n.is_empty()) {
            if ctx.state.is_me(nick) {
                info!(channel = %name, "left");
                ctx.state.remove_channel(name);
            } else if let Some(channel) = ctx.state.channel_mut(name) {
                channel.remove_member(nick);
            }
        }
        Ok(())
    }
}

/// `KICK <channel> <nick>`: like `PART` for the target, with optional auto-rejoin.
pub struct KickHandler;

impl Handler for KickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 0)?;
        let target = param(msg, 1)?;

        if !ctx.state.is_me(target) {
            if let Some(channel) = ctx.state.channel_mut(name) {
                channel.remove_member(target);
            }
            return Ok(());
        }

        info!(
            channel = %name,
            by = msg.source_nickname().unwrap_or("*"),
            reason = msg.param(2).unwrap_or_default(),
            "kicked"
        );
        let removed = ctx.state.remove_channel(name);

        if ctx.config.auto_rejoin {
            let key = removed
                .as_ref()
                .and_then(|channel| channel.mode_params.get(&'k'))
                .and_then(|params| params.first().cloned());
            match key {
                Some(key) => ctx.send("JOIN", [name.to_string(), key]),
                None => ctx.send("JOIN", [name]),
            }
        }
        Ok(())
    }
}

/// `TOPIC <channel> :<text>`: someone changed the topic just now.
pub struct TopicHandler;

impl Handler for TopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 0)?;
        let text = msg.param(1).unwrap_or_default();
        let setter = msg.origin.as_ref().map(|origin| match origin.nick() {
            Some(nick) => nick.to_string(),
            None => origin.to_string(),
        });

        if let Some(channel) = ctx.state.channel_mut(name) {
            channel.topic = (!text.is_empty()).then(|| text.to_string());
            channel.topic_setter = setter;
            channel.topic_time = Some(Utc::now());
        }
        Ok(())
    }
}

/// `RPL_TOPIC <me> <channel> :<text>`.
pub struct RplTopicHandler;

impl Handler for RplTopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        let text = param(msg, 2)?;
        if let Some(channel) = ctx.state.channel_mut(name) {
            channel.topic = Some(text.to_string());
        }
        Ok(())
    }
}

/// `RPL_NOTOPIC <me> <channel>`.
pub struct NoTopicHandler;

impl Handler for NoTopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        if let Some(channel) = ctx.state.channel_mut(name) {
            channel.topic = None;
            channel.topic_setter = None;
            channel.topic_time = None;
        }
        Ok(())
    }
}

/// `RPL_TOPICWHOTIME <me> <channel> <setter> <time>`.
pub struct TopicWhoTimeHandler;

impl Handler for TopicWhoTimeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        let setter = param(msg, 2)?;
        if let Some(channel) = ctx.state.channel_mut(name) {
            channel.topic_setter = Some(setter.to_string());
            channel.topic_time = msg.param(3).and_then(parse_timestamp);
        }
        Ok(())
    }
}

/// `RPL_CHANNELMODEIS <me> <channel> <modes> [args...]`.
pub struct ChannelModeIsHandler;

impl Handler for ChannelModeIsHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        let modes = param(msg, 2)?;
        let state = &mut *ctx.state;
        if let Some(channel) = state.channels.get_mut(&irc_to_lower(name)) {
            channel.set_modes(modes, &msg.params[3..], &state.support);
        }
        Ok(())
    }
}

/// `RPL_CREATIONTIME <me> <channel> <time>`.
pub struct CreationTimeHandler;

impl Handler for CreationTimeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        let created = parse_timestamp(param(msg, 2)?);
        if let Some(channel) = ctx.state.channel_mut(name) {
            channel.created = created;
        }
        Ok(())
    }
}

/// `RPL_NAMREPLY <me> [<type>] <channel> :<entries>`.
///
/// The first reply of a listing replaces the member table; later ones extend it
/// until `RPL_ENDOFNAMES`.
pub struct NamReplyHandler;

impl Handler for NamReplyHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        // Some servers omit the channel type symbol.
        let (name, entries) = if msg.params.len() == 3 {
            (param(msg, 1)?, param(msg, 2)?)
        } else {
            (param(msg, 2)?, param(msg, 3)?)
        };

        let state = &mut *ctx.state;
        let fresh = state.client.names_in_progress.insert(irc_to_lower(name));
        let prefix = state.support.prefix.clone();
        let channel = state.ensure_channel(name);
        if fresh {
            channel.clear_members();
        }

        for entry in entries.split_whitespace() {
            let (symbols, rest) = prefix.split_nick(entry);
            let nick = rest.split(['!', '@']).next().unwrap_or(rest);
            if !nick.is_empty() {
                channel.add_member(nick, symbols);
            }
        }
        Ok(())
    }
}

/// `RPL_ENDOFNAMES <me> <channel>`: emit the finished member list.
pub struct EndOfNamesHandler;

impl Handler for EndOfNamesHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let name = param(msg, 1)?;
        ctx.state.client.names_in_progress.remove(&irc_to_lower(name));

        let (channel, members): (String, Vec<Member>) = match ctx.state.channel(name) {
            Some(channel) => (channel.name.clone(), channel.members().cloned().collect()),
            None => (name.to_string(), Vec::new()),
        };
        debug!(channel = %channel, count = members.len(), "names complete");
        ctx.emit(Event::Names { channel, members });
        Ok(())
    }
}
