//! Connection lifecycle handlers: registration, keepalive, nick changes and
//! users leaving the network.

use std::sync::Arc;

use chatmux_proto::Message;
use tracing::{debug, info, warn};

use super::core::{Context, Handler, HandlerResult};
use super::helpers::{param, source_nick};
use crate::event::Event;
use crate::state::Phase;

/// `PING` → `PONG` with the same token.
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let token = param(msg, 0)?;
        ctx.send("PONG", [token]);
        Ok(())
    }
}

/// `RPL_WELCOME`: the only way into [`Phase::Connected`].
pub struct WelcomeHandler;

impl Handler for WelcomeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = param(msg, 0)?.to_string();

        let client = &mut ctx.state.client;
        client.nick = nick.clone();
        client.nick_retries = 0;
        client.server_name = msg
            .origin
            .as_ref()
            .and_then(|origin| origin.server())
            .map(str::to_string);
        ctx.state.phase = Phase::Connected;

        info!(nick = %nick, server = ?ctx.state.client.server_name, "registered");
        ctx.emit(Event::Registered { nick });

        let config = ctx.config;
        for channel in &config.channels {
            ctx.send("JOIN", [channel.as_str()]);
        }
        Ok(())
    }
}

/// `ERR_NICKNAMEINUSE` while registering: try `<nick>1`, `<nick>2`, ...
///
/// The base nick is shortened when needed so the candidate fits `NICKLEN`.
/// Once registered the error is left to the caller.
pub struct NickInUseHandler;

impl Handler for NickInUseHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        if ctx.state.phase != Phase::Registering {
            return Ok(());
        }

        ctx.state.client.nick_retries += 1;
        let suffix = ctx.state.client.nick_retries.to_string();
        let max_len = ctx.state.support.nicklength as usize;
        let base: String = ctx
            .config
            .nick
            .chars()
            .take(max_len.saturating_sub(suffix.len()).max(1))
            .collect();
        let candidate = format!("{}{}", base, suffix);

        debug!(
            rejected = msg.param(1).unwrap_or("*"),
            candidate = %candidate,
            "nickname in use, retrying"
        );
        ctx.state.client.nick = candidate.clone();
        ctx.send("NICK", [candidate]);
        Ok(())
    }
}

/// `NICK`: follow our own renames and rename members everywhere.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let old = source_nick(msg)?;
        let new = param(msg, 0)?;

        if ctx.state.is_me(old) {
            info!(old = %old, new = %new, "own nick changed");
            ctx.state.client.nick = new.to_string();
        }
        ctx.state.rename_member_everywhere(old, new);
        Ok(())
    }
}

/// `QUIT`: the user left every channel.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = source_nick(msg)?;
        let channels = ctx.state.remove_member_everywhere(nick);
        debug!(nick = %nick, channels = ?channels, "user quit");
        Ok(())
    }
}

/// `KILL <nick>`: the named user left every channel.
pub struct KillHandler;

impl Handler for KillHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let nick = param(msg, 0)?;
        ctx.state.remove_member_everywhere(nick);
        Ok(())
    }
}

/// `ERROR`: the server is about to close the link.
pub struct ErrorHandler;

impl Handler for ErrorHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let text = msg.trailing().unwrap_or_default().to_string();
        warn!(error = %text, "server sent ERROR");
        ctx.state.client.last_error = Some(text.clone());
        ctx.emit(Event::Error(text));
        Ok(())
    }
}
