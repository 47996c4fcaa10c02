//! chatmux - the IRC client core of a chat aggregator.
//!
//! An async RFC 2812 client: it frames and parses the server's byte stream,
//! drives registration, answers keepalives and keeps an in-memory cache of
//! the channels and users it sees. Callers get a connect operation, a line
//! send primitive, a broadcast event feed and read-only snapshots.
//!
//! The wire layer (framing, parsing, serialization, the command table and
//! `RPL_ISUPPORT`) lives in the `chatmux-proto` crate.
//!
//! ```no_run
//! use chatmux::{ClientConfig, ClientRegistry, Event};
//!
//! # async fn run() -> Result<(), chatmux::ClientError> {
//! let registry = ClientRegistry::default();
//! let mut config = ClientConfig::new("irc.libera.chat", "chatmux");
//! config.channels = vec!["#chatmux".into()];
//!
//! let client = registry.get_or_create(config);
//! let mut events = client.subscribe();
//! client.connect().await?;
//! client.send("PRIVMSG", ["#chatmux", "hello"]).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let Event::PrivateMessage { from, text, .. } = event {
//!         println!("<{}> {}", from, text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod registry;
pub mod state;
pub mod transport;

pub use chatmux_proto as proto;

pub use client::Client;
pub use config::{ClientConfig, Config, ConfigError};
pub use error::ClientError;
pub use event::Event;
pub use registry::ClientRegistry;
pub use state::{Channel, Member, Phase, WhoisRecord};
pub use transport::{BoxedStream, Connector, TcpConnector};
