//! Core configuration types and loading.

use std::net::IpAddr;
use std::path::Path;

use chatmux_proto::irc_to_lower;
use serde::Deserialize;
use thiserror::Error;

use super::defaults::{
    default_encoding, default_max_line_length, default_port, default_retry_delay_ms, default_true,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration file: one `[[client]]` table per IRC session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sessions to open.
    #[serde(default, rename = "client")]
    pub clients: Vec<ClientConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Settings for a single IRC session.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Server hostname or address.
    pub server: String,
    /// Server port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wrap the connection in TLS.
    #[serde(default)]
    pub tls: bool,
    /// Skip certificate verification. Only for testing against self-signed servers.
    #[serde(default)]
    pub tls_insecure: bool,
    /// Nickname to register with.
    pub nick: String,
    /// Username (ident). Defaults to the nickname.
    #[serde(default)]
    pub username: Option<String>,
    /// Real name. Defaults to the nickname.
    #[serde(default)]
    pub realname: Option<String>,
    /// Connection password, sent as `PASS` before registering.
    #[serde(default)]
    pub password: Option<String>,
    /// Local address to bind before connecting.
    #[serde(default)]
    pub local_address: Option<IpAddr>,
    /// Encoding label for the byte stream (default: `utf-8`).
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Channels joined once registration completes.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Rejoin a channel after being kicked from it.
    #[serde(default)]
    pub auto_rejoin: bool,
    /// Accepted but not acted upon; sessions are never re-established automatically.
    #[serde(default)]
    pub auto_reconnect: bool,
    /// See `auto_reconnect`.
    #[serde(default)]
    pub retry_count: u32,
    /// See `auto_reconnect`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Cap on a single inbound line, in bytes. `0` disables the cap.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Drop empty inbound lines instead of reporting them as parse errors.
    #[serde(default = "default_true")]
    pub strip_empty_lines: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            tls: false,
            tls_insecure: false,
            nick: String::new(),
            username: None,
            realname: None,
            password: None,
            local_address: None,
            encoding: default_encoding(),
            channels: Vec::new(),
            auto_rejoin: false,
            auto_reconnect: false,
            retry_count: 0,
            retry_delay_ms: default_retry_delay_ms(),
            max_line_length: default_max_line_length(),
            strip_empty_lines: true,
        }
    }
}

impl ClientConfig {
    /// Minimal config for `nick` on `server`, everything else defaulted.
    pub fn new(server: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            nick: nick.into(),
            ..Self::default()
        }
    }

    /// Username sent in `USER`.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }

    /// Real name sent in `USER`.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nick)
    }

    /// Line cap handed to the frame splitter.
    pub fn line_limit(&self) -> Option<usize> {
        (self.max_line_length > 0).then_some(self.max_line_length)
    }

    /// Key identifying this session in a [`ClientRegistry`](crate::registry::ClientRegistry).
    pub fn registry_key(&self) -> String {
        format!(
            "{}@{}",
            irc_to_lower(&self.nick),
            self.server.to_ascii_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            server = "irc.example.net"
            nick = "alice"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6667);
        assert!(!config.tls);
        assert_eq!(config.encoding, "utf-8");
        assert_eq!(config.max_line_length, 8191);
        assert!(config.strip_empty_lines);
        assert!(config.channels.is_empty());
        assert_eq!(config.username(), "alice");
        assert_eq!(config.realname(), "alice");
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[[client]]
server = "irc.libera.chat"
port = 6697
tls = true
nick = "bob"
realname = "Bob B."
channels = ["#rust", "#tokio"]
local_address = "127.0.0.1"

[[client]]
server = "irc.oftc.net"
nick = "bob"
max_line_length = 0
"##
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.clients.len(), 2);

        let first = &config.clients[0];
        assert_eq!(first.port, 6697);
        assert!(first.tls);
        assert_eq!(first.realname(), "Bob B.");
        assert_eq!(first.channels, vec!["#rust", "#tokio"]);
        assert_eq!(first.local_address, Some("127.0.0.1".parse().unwrap()));

        assert_eq!(config.clients[1].line_limit(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/chatmux.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = toml::from_str::<Config>("[[client]]\nport = \"x\"").unwrap_err();
        let err: ConfigError = err.into();
        assert!(err.to_string().starts_with("failed to parse config"));
    }

    #[test]
    fn test_registry_key_is_case_folded() {
        let a = ClientConfig::new("IRC.Example.net", "Alice[m]");
        let b = ClientConfig::new("irc.example.net", "alice{m}");
        assert_eq!(a.registry_key(), "alice{m}@irc.example.net");
        assert_eq!(a.registry_key(), b.registry_key());
    }
}
