//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use chatmux_proto::FrameSplitter;
use thiserror::Error;

use super::{ClientConfig, Config};

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no [[client]] sections configured")]
    NoClients,
    #[error("client.server is required")]
    MissingServer,
    #[error("client.nick is required")]
    MissingNick,
    #[error("client.nick contains invalid characters: {0}")]
    InvalidNick(String),
    #[error("client.encoding is not a known encoding: {0}")]
    UnknownEncoding(String),
    #[error("client.channels entry is not a channel name: {0}")]
    InvalidChannel(String),
    #[error("client.tls_insecure is set but tls is disabled")]
    InsecureWithoutTls,
}

/// Validate a whole configuration file, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    if config.clients.is_empty() {
        return Err(vec![ValidationError::NoClients]);
    }

    let errors: Vec<ValidationError> = config
        .clients
        .iter()
        .filter_map(|client| validate_client(client).err())
        .flatten()
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validate a single session's settings.
pub fn validate_client(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.is_empty() {
        errors.push(ValidationError::MissingServer);
    }

    if config.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if config
        .nick
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ':' | '!' | '@' | ',' | '\0'))
    {
        errors.push(ValidationError::InvalidNick(config.nick.clone()));
    }

    if FrameSplitter::new(&config.encoding).is_err() {
        errors.push(ValidationError::UnknownEncoding(config.encoding.clone()));
    }

    for channel in &config.channels {
        if channel.is_empty() || channel.contains(|c: char| c.is_whitespace() || c == ',') {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    if config.tls_insecure && !config.tls {
        errors.push(ValidationError::InsecureWithoutTls);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_client() {
        let config = ClientConfig::new("irc.example.net", "alice");
        assert!(validate_client(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ClientConfig {
            encoding: "klingon".into(),
            channels: vec!["#ok".into(), "#a b".into()],
            tls_insecure: true,
            ..ClientConfig::default()
        };
        let errors = validate_client(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingServer,
                ValidationError::MissingNick,
                ValidationError::UnknownEncoding("klingon".into()),
                ValidationError::InvalidChannel("#a b".into()),
                ValidationError::InsecureWithoutTls,
            ]
        );
    }

    #[test]
    fn test_invalid_nick() {
        let config = ClientConfig::new("irc.example.net", "bad nick");
        assert_eq!(
            validate_client(&config).unwrap_err(),
            vec![ValidationError::InvalidNick("bad nick".into())]
        );
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(
            validate(&Config::default()).unwrap_err(),
            vec![ValidationError::NoClients]
        );
    }
}
