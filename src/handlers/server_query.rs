//! Server information: `RPL_ISUPPORT` and the message of the day.

use std::sync::Arc;

use chatmux_proto::Message;
use tracing::{debug, trace};

use super::core::{Context, Handler, HandlerResult};
use crate::event::Event;

/// `RPL_ISUPPORT <me> <token>... :are supported by this server`.
pub struct IsupportHandler;

impl Handler for IsupportHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        ctx.state.support.apply_params(&msg.params);
        trace!(support = ?ctx.state.support, "server support updated");
        Ok(())
    }
}

/// `RPL_MOTDSTART`, `RPL_MOTD`, `RPL_ENDOFMOTD` and `ERR_NOMOTD`.
pub struct MotdHandler;

impl Handler for MotdHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        match msg.command.as_str() {
            "RPL_MOTDSTART" => ctx.state.client.motd.clear(),
            "RPL_MOTD" => {
                let text = msg.trailing().unwrap_or_default();
                let line = text.strip_prefix("- ").unwrap_or(text);
                ctx.state.client.motd.push(line.to_string());
            }
            "RPL_ENDOFMOTD" => {
                let motd = std::mem::take(&mut ctx.state.client.motd).join("\n");
                debug!(len = motd.len(), "motd received");
                ctx.emit(Event::Motd(motd));
            }
            "ERR_NOMOTD" => {
                ctx.state.client.motd.clear();
                ctx.emit(Event::Motd(String::new()));
            }
            _ => {}
        }
        Ok(())
    }
}
