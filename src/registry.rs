//! Pool of sessions keyed by `nick@server`.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::transport::{Connector, TcpConnector};

/// Hands out one shared [`Client`] per `nick@server`.
///
/// Asking twice for the same nick and server (compared case-insensitively)
/// returns handles to the same session; the second configuration is ignored.
pub struct ClientRegistry {
    clients: DashMap<String, Client>,
    connector: Arc<dyn Connector>,
}

impl ClientRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            clients: DashMap::new(),
            connector,
        }
    }

    /// The session for `config`, created (but not connected) on first use.
    pub fn get_or_create(&self, config: ClientConfig) -> Client {
        let key = config.registry_key();
        self.clients
            .entry(key)
            .or_insert_with(|| {
                debug!(server = %config.server, nick = %config.nick, "creating session");
                Client::new(config, Arc::clone(&self.connector))
            })
            .clone()
    }

    /// The session for `nick` on `server`, if one exists.
    pub fn get(&self, nick: &str, server: &str) -> Option<Client> {
        let key = ClientConfig::new(server, nick).registry_key();
        self.clients.get(&key).map(|entry| entry.clone())
    }

    /// Forget a session. Existing handles keep working.
    pub fn remove(&self, nick: &str, server: &str) -> Option<Client> {
        let key = ClientConfig::new(server, nick).registry_key();
        self.clients.remove(&key).map(|(_, client)| client)
    }

    /// Every session, in no particular order.
    pub fn clients(&self) -> Vec<Client> {
        self.clients.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(Arc::new(TcpConnector))
    }
}
