//! Message delivery handlers.

use std::sync::Arc;

use chatmux_proto::Message;

use super::core::{Context, Handler, HandlerResult};
use super::helpers::param;
use crate::event::Event;

/// `PRIVMSG` addressed to our own nick becomes [`Event::PrivateMessage`].
///
/// Channel messages are only delivered through [`Event::Message`].
pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let target = param(msg, 0)?;
        if !ctx.state.is_me(target) {
            return Ok(());
        }

        let from = match &msg.origin {
            Some(origin) => origin.nick().map_or_else(|| origin.to_string(), str::to_string),
            None => String::new(),
        };
        let text = msg.param(1).unwrap_or_default().to_string();
        ctx.emit(Event::PrivateMessage {
            from,
            text,
            message: Arc::clone(msg),
        });
        Ok(())
    }
}
