//! Handler context and core types.
//!
//! Handlers run synchronously under the session lock. They never touch the
//! transport: replies and events are queued on the [`Context`] and flushed by
//! the reader task once the lock is released.

use std::sync::Arc;

use chatmux_proto::Message;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::event::Event;
use crate::state::SessionState;

/// A line to send once dispatch is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub command: &'static str,
    pub params: Vec<String>,
}

/// Everything a dispatch produced.
#[derive(Debug, Default)]
pub struct Effects {
    pub outbound: Vec<Outbound>,
    pub events: Vec<Event>,
}

/// Handler context passed to each inbound-message handler.
pub struct Context<'a> {
    /// Session state, exclusively borrowed for the duration of the dispatch.
    pub state: &'a mut SessionState,
    /// Settings of this session.
    pub config: &'a ClientConfig,
    effects: Effects,
}

impl<'a> Context<'a> {
    pub fn new(state: &'a mut SessionState, config: &'a ClientConfig) -> Self {
        Self {
            state,
            config,
            effects: Effects::default(),
        }
    }

    /// Queue a command for sending.
    pub fn send<I, S>(&mut self, command: &'static str, params: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effects.outbound.push(Outbound {
            command,
            params: params.into_iter().map(Into::into).collect(),
        });
    }

    /// Queue an event for subscribers.
    pub fn emit(&mut self, event: Event) {
        self.effects.events.push(event);
    }

    pub fn into_effects(self) -> Effects {
        self.effects
    }
}

/// Errors a handler reports for a message it could not make sense of.
///
/// These are logged and otherwise ignored; the session carries on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{command}: expected at least {expected} parameters, got {got}")]
    NeedMoreParams {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("{0}: message has no user origin")]
    NoOrigin(String),
}

pub type HandlerResult = Result<(), HandlerError>;

/// A handler for one or more inbound commands.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Arc<Message>) -> HandlerResult;
}
