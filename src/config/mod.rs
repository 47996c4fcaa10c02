//! Configuration loading and management.
//!
//! - [`types`]: the config structs and TOML loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use types::{ClientConfig, Config, ConfigError};
pub use validation::{ValidationError, validate, validate_client};
