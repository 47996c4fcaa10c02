//! `MODE` handler.

use std::sync::Arc;

use chatmux_proto::{Message, irc_to_lower};
use tracing::debug;

use super::core::{Context, Handler, HandlerResult};
use super::helpers::param;

/// `MODE <target> <changes> [args...]`.
///
/// Channel mode changes are applied to the cached channel using the server's
/// `CHANMODES` and `PREFIX`. User modes are not tracked.
pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult {
        let target = param(msg, 0)?;
        let changes = param(msg, 1)?;

        let state = &mut *ctx.state;
        if !state.support.is_channel(target) {
            debug!(target = %target, changes = %changes, "user mode change");
            return Ok(());
        }

        if let Some(channel) = state.channels.get_mut(&irc_to_lower(target)) {
            channel.apply_modes(changes, &msg.params[2..], &state.support);
            debug!(channel = %target, changes = %changes, modes = %channel.modes, "channel modes updated");
        }
        Ok(())
    }
}
