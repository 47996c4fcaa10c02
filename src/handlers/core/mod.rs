//! Core handler infrastructure: the context handed to every handler and the
//! registry that routes inbound messages by canonical command name.

pub mod context;
pub mod registry;

pub use context::{Context, Effects, Handler, HandlerError, HandlerResult, Outbound};
pub use registry::Registry;
