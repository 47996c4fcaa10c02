//! Integration test common infrastructure.
//!
//! Sessions run over in-memory `tokio::io::duplex` pipes: the test holds the
//! server end as a [`TestServer`] and scripts the conversation line by line.

pub mod connector;
pub mod server;

use std::time::Duration;

use chatmux::Event;
use tokio::sync::broadcast;
use tokio::time::timeout;

#[allow(unused_imports)]
pub use connector::DuplexConnector;
#[allow(unused_imports)]
pub use server::TestServer;

/// Wait for the first event matching `predicate`, skipping the rest.
#[allow(dead_code)]
pub async fn next_event<F>(events: &mut broadcast::Receiver<Event>, mut predicate: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Wait until the session has processed `line`, by watching for it to come
/// back as a generic message event.
#[allow(dead_code)]
pub async fn processed(events: &mut broadcast::Receiver<Event>, raw: &str) {
    next_event(events, |event| matches!(event, Event::Message(msg) if msg.raw == raw)).await;
}
