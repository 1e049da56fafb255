//! Configuration loading and management.
//!
//! - [`types`]: the TOML document (`[bot]`, `[[network]]`) and the resolved
//!   per-connection [`ConnectionConfig`]
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
pub mod validation;

pub use types::{BotConfig, Config, ConfigError, ConnectionConfig, NetworkConfig};
