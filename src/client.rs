//! One IRC session.
//!
//! A [`Client`] owns a transport, drives registration and keeps the
//! [`SessionState`] cache current:
//!
//! ```text
//!   connect() ──▶ Connector ──▶ PASS/NICK/USER ──▶ reader task
//!                                                   │
//!          FramedRead<LineCodec> ──▶ Message::parse ──▶ handlers::process
//!                                                   │        (state lock)
//!                                     outbound ◀────┴────▶ broadcast<Event>
//! ```
//!
//! The state lock is only held while a handler runs. Replies are written and
//! events broadcast after it is released.

use std::sync::Arc;

use chatmux_proto::{FrameSplitter, LineCodec, Message, ServerSupport, serialize};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::event::Event;
use crate::handlers;
use crate::state::{Channel, Phase, SessionState};
use crate::transport::{BoxedStream, Connector};

/// Events buffered per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 1024;

type LineReader = FramedRead<ReadHalf<BoxedStream>, LineCodec>;
type LineWriter = FramedWrite<WriteHalf<BoxedStream>, LineCodec>;

/// Handle to one session. Cloning is cheap; all clones share the session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    state: parking_lot::Mutex<SessionState>,
    writer: tokio::sync::Mutex<Option<LineWriter>>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<Event>,
    /// Mirrors `state.phase`; only written while the state lock is held.
    phase: watch::Sender<Phase>,
}

impl Client {
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        if config.auto_reconnect {
            warn!(
                server = %config.server,
                retry_count = config.retry_count,
                retry_delay_ms = config.retry_delay_ms,
                "auto_reconnect is not supported, ignoring"
            );
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase, _) = watch::channel(Phase::Disconnected);
        let state = SessionState::new(config.nick.clone());

        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                state: parking_lot::Mutex::new(state),
                writer: tokio::sync::Mutex::new(None),
                reader: parking_lot::Mutex::new(None),
                events,
                phase,
            }),
        }
    }

    /// Connect and register.
    ///
    /// Returns immediately when already registered. A call made while another
    /// attempt is in flight waits for that attempt instead of starting one.
    ///
    /// # Errors
    ///
    /// The connector's error when the transport cannot be opened, or
    /// [`ClientError::Registration`] when the connection ends before
    /// `RPL_WELCOME`, or [`ClientError::Closed`] when `disconnect()` cancels
    /// the attempt.
    pub async fn connect(&self) -> Result<()> {
        let (attempt, mut phase_rx) = {
            let mut state = self.inner.state.lock();
            let phase_rx = self.inner.phase.subscribe();
            match state.phase {
                Phase::Connected => return Ok(()),
                Phase::Connecting | Phase::Registering => (None, phase_rx),
                Phase::Disconnected => {
                    state.reset(&self.inner.config.nick);
                    state.attempt += 1;
                    self.set_phase(&mut state, Phase::Connecting);
                    (Some(state.attempt), phase_rx)
                }
            }
        };

        if let Some(attempt) = attempt {
            match self.open(attempt).await {
                Ok(()) => {}
                // Superseded by disconnect(); the session is already torn down.
                Err(ClientError::Closed) => return Err(ClientError::Closed),
                Err(e) => {
                    warn!(server = %self.inner.config.server, kind = e.kind(), error = %e, "connection attempt failed");
                    self.abort_reader();
                    self.inner.writer.lock().await.take();
                    self.finish(Some(e.to_string()));
                    return Err(e);
                }
            }
        }

        let phase = *phase_rx
            .wait_for(|phase| !phase.is_pending())
            .await
            .map_err(|_| ClientError::Closed)?;

        match phase {
            Phase::Connected => Ok(()),
            _ => {
                let state = self.inner.state.lock();
                if state.client.requested_disconnect {
                    return Err(ClientError::Closed);
                }
                let reason = state
                    .client
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "connection closed".to_string());
                Err(ClientError::Registration(reason))
            }
        }
    }

    /// Open the transport, start the reader and send the registration burst.
    ///
    /// Returns [`ClientError::Closed`] without touching the session when
    /// `attempt` was cancelled by `disconnect()` while the connector ran.
    async fn open(&self, attempt: u64) -> Result<()> {
        let config = &self.inner.config;
        let splitter = FrameSplitter::new(&config.encoding)?
            .with_max_len(config.line_limit())
            .strip_empty_lines(config.strip_empty_lines);
        let encoder = LineCodec::new(&config.encoding)?;

        let stream = self.inner.connector.connect(config).await?;

        // Holding the writer lock keeps disconnect() out until the reader is in place.
        let mut writer = self.inner.writer.lock().await;
        {
            let mut state = self.inner.state.lock();
            if state.attempt != attempt || state.phase != Phase::Connecting {
                debug!(server = %config.server, attempt, "connection attempt cancelled");
                return Err(ClientError::Closed);
            }
            self.set_phase(&mut state, Phase::Registering);
        }

        let (read_half, write_half) = tokio::io::split(stream);
        *writer = Some(FramedWrite::new(write_half, encoder));
        let reader = FramedRead::new(read_half, LineCodec::from_splitter(splitter));
        let handle = tokio::spawn(self.clone().read_loop(reader));
        *self.inner.reader.lock() = Some(handle);
        drop(writer);

        let burst = async {
            if let Some(password) = &config.password {
                self.send("PASS", [password.as_str()]).await?;
            }
            self.send("NICK", [config.nick.as_str()]).await?;
            self.send("USER", [config.username(), "8", "*", config.realname()])
                .await
        };
        match burst.await {
            // The transport is already gone; the phase watch reports why.
            Err(ClientError::NotConnected) => Ok(()),
            other => other,
        }
    }

    /// Serialize and write one command.
    ///
    /// Allowed in any phase with an open transport. Nothing is queued.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotConnected`] without a transport, or a protocol error
    /// when the command cannot be serialized.
    pub async fn send<I, S>(&self, command: &str, params: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let params: Vec<S> = params.into_iter().collect();
        let line = serialize(command, &params)?;

        let mut writer = self.inner.writer.lock().await;
        let writer = writer.as_mut().ok_or(ClientError::NotConnected)?;
        debug!(line = %line.trim_end(), "send");
        writer.send(line).await?;
        Ok(())
    }

    /// Send `QUIT` and close the transport.
    ///
    /// Subscribers see `Disconnected { requested: true }`. Does nothing when
    /// already disconnected.
    pub async fn disconnect(&self, reason: Option<&str>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Disconnected {
                return Ok(());
            }
            state.client.requested_disconnect = true;
        }

        let quit = self.send("QUIT", reason).await;
        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            if let Err(e) = writer.close().await {
                debug!(error = %e, "error closing transport");
            }
        }
        self.abort_reader();
        self.finish(None);

        match quit {
            Err(ClientError::NotConnected) => Ok(()),
            other => other,
        }
    }

    /// Receive every event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Our nick as the server knows it.
    pub fn nick(&self) -> String {
        self.inner.state.lock().client.nick.clone()
    }

    /// Snapshot of the server's advertised limits.
    pub fn support(&self) -> ServerSupport {
        self.inner.state.lock().support.clone()
    }

    /// Snapshot of one joined channel.
    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.inner.state.lock().channel(name).cloned()
    }

    /// Names of the joined channels, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .state
            .lock()
            .channels
            .values()
            .map(|channel| channel.name.clone())
            .collect();
        names.sort();
        names
    }

    async fn read_loop(self, mut reader: LineReader) {
        let error = loop {
            match reader.next().await {
                Some(Ok(line)) => {
                    if let Err(e) = self.handle_line(&line).await {
                        warn!(kind = e.kind(), error = %e, "failed to write reply");
                        break Some(e.to_string());
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "transport error");
                    break Some(e.to_string());
                }
                None => {
                    info!(server = %self.inner.config.server, "connection closed by server");
                    break None;
                }
            }
        };

        self.inner.writer.lock().await.take();
        self.inner.reader.lock().take();
        self.finish(error);
    }

    async fn handle_line(&self, line: &str) -> Result<()> {
        debug!(line = %line, "recv");

        let msg = match Message::parse(line) {
            Ok(msg) => Arc::new(msg),
            Err(e) => {
                warn!(error = %e, line = %line, "failed to parse line");
                self.emit(Event::Error(e.to_string()));
                return Ok(());
            }
        };

        let effects = {
            let mut state = self.inner.state.lock();
            let before = state.phase;
            let effects = handlers::process(&mut state, &self.inner.config, msg);
            let after = state.phase;
            if after != before {
                info!(server = %self.inner.config.server, from = %before, to = %after, "phase changed");
                self.inner.phase.send_replace(after);
            }
            effects
        };

        let mut written = Ok(());
        for outbound in effects.outbound {
            written = self.send(outbound.command, &outbound.params).await;
            if written.is_err() {
                break;
            }
        }
        for event in effects.events {
            self.emit(event);
        }
        written
    }

    /// Tear the session down once. Later calls find it Disconnected and return.
    fn finish(&self, error: Option<String>) {
        let requested = {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Disconnected {
                return;
            }
            if let Some(error) = &error {
                state.client.last_error = Some(error.clone());
            }
            self.set_phase(&mut state, Phase::Disconnected);
            state.client.requested_disconnect
        };

        if let Some(error) = error {
            self.emit(Event::Error(error));
        }
        self.emit(Event::Disconnected { requested });
    }

    fn set_phase(&self, state: &mut SessionState, phase: Phase) {
        if state.phase != phase {
            info!(server = %self.inner.config.server, from = %state.phase, to = %phase, "phase changed");
        }
        state.phase = phase;
        self.inner.phase.send_replace(phase);
    }

    fn abort_reader(&self) {
        if let Some(handle) = self.inner.reader.lock().take() {
            handle.abort();
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.inner.config.server)
            .field("nick", &self.inner.config.nick)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Refusing;

    #[async_trait]
    impl Connector for Refusing {
        async fn connect(&self, _config: &ClientConfig) -> Result<BoxedStream> {
            Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )))
        }
    }

    fn client() -> Client {
        Client::new(ClientConfig::new("irc.example.net", "alice"), Arc::new(Refusing))
    }

    #[tokio::test]
    async fn test_send_without_transport() {
        let err = client().send("PRIVMSG", ["#c", "hi"]).await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }

    #[tokio::test]
    async fn test_failed_connect_returns_to_disconnected() {
        let client = client();
        let mut events = client.subscribe();

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
        assert_eq!(client.phase(), Phase::Disconnected);

        assert!(matches!(events.recv().await.unwrap(), Event::Error(_)));
        assert!(matches!(
            events.recv().await.unwrap(),
            Event::Disconnected { requested: false }
        ));
    }

    #[tokio::test]
    async fn test_disconnect_when_idle_is_noop() {
        let client = client();
        client.disconnect(Some("bye")).await.unwrap();
        assert_eq!(client.phase(), Phase::Disconnected);
    }

    #[test]
    fn test_snapshots_before_connect() {
        let client = client();
        assert_eq!(client.nick(), "alice");
        assert_eq!(client.support().nicklength, 9);
        assert!(client.channels().is_empty());
        assert!(client.channel("#rust").is_none());
    }
}
