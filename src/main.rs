//! chatmux - run the configured IRC sessions and log what happens on them.
//!
//! Usage: `chatmux [config.toml]` (defaults to `chatmux.toml`).

use chatmux::config::validate;
use chatmux::handlers::registry;
use chatmux::{Client, ClientRegistry, Config, Event};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chatmux.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(path = %config_path, clients = config.clients.len(), "Configuration loaded");

    let sessions = ClientRegistry::default();
    for client_config in config.clients {
        let client = sessions.get_or_create(client_config);
        tokio::spawn(log_events(client.clone()));

        let server = client.config().server.clone();
        match client.connect().await {
            Ok(()) => info!(server = %server, nick = %client.nick(), "Session registered"),
            Err(e) => warn!(server = %server, kind = e.kind(), error = %e, "Session failed to register"),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    for client in sessions.clients() {
        if let Err(e) = client.disconnect(Some("chatmux shutting down")).await {
            warn!(server = %client.config().server, error = %e, "Failed to disconnect cleanly");
        }
    }

    for (command, count) in registry().command_stats() {
        debug!(command, count, "Handler usage");
    }
    Ok(())
}

async fn log_events(client: Client) {
    let server = client.config().server.clone();
    let mut events = client.subscribe();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(server = %server, skipped, "Event subscriber lagged");
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        };

        match event {
            Event::Registered { nick } => info!(server = %server, nick = %nick, "Registered"),
            Event::PrivateMessage { from, text, .. } => {
                info!(server = %server, from = %from, text = %text, "Private message")
            }
            Event::Motd(motd) => {
                for line in motd.lines() {
                    info!(server = %server, "MOTD: {}", line);
                }
            }
            Event::Names { channel, members } => {
                info!(server = %server, channel = %channel, members = members.len(), "Names")
            }
            Event::Whois(record) => info!(server = %server, record = ?record, "Whois"),
            Event::Error(text) => warn!(server = %server, error = %text, "Session error"),
            Event::Disconnected { requested } => {
                info!(server = %server, requested, "Disconnected");
            }
            Event::Message(msg) => debug!(server = %server, raw = %msg.raw, "Message"),
        }
    }
}
