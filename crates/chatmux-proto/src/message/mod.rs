//! IRC message types, parsing and serialization.
//!
//! Parsing is strict about the command token: anything that is neither a
//! registered command name nor a known numeric is rejected, so callers only
//! ever see canonical names.

mod parse;
mod serialize;
mod types;

pub use self::serialize::serialize;
pub use self::types::{Message, Origin};
