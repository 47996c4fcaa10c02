//! Inbound message handlers.
//!
//! Every parsed line goes through [`process`], which looks the canonical
//! command name up in the [`Registry`] and lets the handler update the
//! session state. Handlers only queue work: outbound replies and events are
//! returned as [`Effects`] for the reader task to flush.

mod channel;
mod connection;
pub mod core;
mod helpers;
mod messaging;
mod mode;
mod server_query;
mod user_query;

pub use self::core::registry::{process, registry};
pub use self::core::{Context, Effects, Handler, HandlerError, HandlerResult, Outbound, Registry};

pub use channel::{
    ChannelModeIsHandler, CreationTimeHandler, EndOfNamesHandler, JoinHandler, KickHandler,
    NamReplyHandler, NoTopicHandler, PartHandler, RplTopicHandler, TopicHandler,
    TopicWhoTimeHandler,
};
pub use connection::{
    ErrorHandler, KillHandler, NickHandler, NickInUseHandler, PingHandler, QuitHandler,
    WelcomeHandler,
};
pub use messaging::PrivmsgHandler;
pub use mode::ModeHandler;
pub use server_query::{IsupportHandler, MotdHandler};
pub use user_query::{EndOfWhoHandler, EndOfWhoisHandler, WhoReplyHandler, WhoisHandler};
