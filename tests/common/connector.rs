//! A connector that hands out in-memory pipes.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chatmux::{BoxedStream, ClientConfig, ClientError, Connector};
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::server::TestServer;

/// Each `connect()` takes the next prepared pipe. Connecting with none left
/// fails with a refused-connection error.
#[derive(Default)]
pub struct DuplexConnector {
    pending: Mutex<VecDeque<tokio::io::DuplexStream>>,
    gate: Option<Arc<Notify>>,
    connects: Mutex<usize>,
}

impl DuplexConnector {
    /// A connector with one pipe ready, and the server end of that pipe.
    pub fn pair() -> (Arc<Self>, TestServer) {
        let connector = Self::default();
        let server = connector.prepare();
        (Arc::new(connector), server)
    }

    /// Like [`pair`](Self::pair), but `connect()` waits for the returned
    /// `Notify` before handing the pipe out.
    #[allow(dead_code)]
    pub fn gated() -> (Arc<Self>, TestServer, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut connector = Self::default();
        connector.gate = Some(Arc::clone(&gate));
        let server = connector.prepare();
        (Arc::new(connector), server, gate)
    }

    /// Queue another pipe and return its server end.
    pub fn prepare(&self) -> TestServer {
        let (client_end, server_end) = tokio::io::duplex(64 * 1024);
        self.pending.lock().push_back(client_end);
        TestServer::new(server_end)
    }

    /// How many times `connect()` was called.
    #[allow(dead_code)]
    pub fn connects(&self) -> usize {
        *self.connects.lock()
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, _config: &ClientConfig) -> Result<BoxedStream, ClientError> {
        *self.connects.lock() += 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.pending.lock().pop_front() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "no pipe prepared",
            ))),
        }
    }
}
