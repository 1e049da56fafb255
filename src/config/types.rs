//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_command_prefix, default_port, default_quit_message, default_username,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Settings shared by every network.
    #[serde(default)]
    pub bot: BotConfig,
    /// One entry per network to connect to.
    #[serde(default, rename = "network")]
    pub networks: Vec<NetworkConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve every `[[network]]` block against the `[bot]` defaults.
    pub fn connections(&self) -> Vec<ConnectionConfig> {
        self.networks
            .iter()
            .map(|network| ConnectionConfig::resolve(network, &self.bot))
            .collect()
    }
}

/// The `[bot]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Character that marks a bot command, e.g. `!` in `!say`.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
    /// Reason sent with the final QUIT on shutdown.
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            quit_message: default_quit_message(),
        }
    }
}

/// One `[[network]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Connection name used in logs; defaults to the authority.
    pub name: Option<String>,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub nick: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub realname: String,
    /// Channels joined once registration completes.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Hosts (exact match) allowed to use owner-only hooks.
    #[serde(default)]
    pub owners: Vec<String>,
}

/// Everything one connection needs, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub channels: Vec<String>,
    pub owners: Vec<String>,
    pub command_prefix: char,
    pub quit_message: String,
}

impl ConnectionConfig {
    /// A config with defaults for everything but the address and nick.
    pub fn new(host: impl Into<String>, port: u16, nick: impl Into<String>) -> Self {
        let host = host.into();
        let nick = nick.into();
        Self {
            name: format!("{nick}@{host}:{port}"),
            host,
            port,
            nick,
            username: default_username(),
            realname: String::new(),
            channels: Vec::new(),
            owners: Vec::new(),
            command_prefix: default_command_prefix(),
            quit_message: default_quit_message(),
        }
    }

    fn resolve(network: &NetworkConfig, bot: &BotConfig) -> Self {
        let mut config = Self::new(network.host.clone(), network.port, network.nick.clone());
        if let Some(name) = &network.name {
            config.name = name.clone();
        }
        config.username = network.username.clone();
        config.realname = network.realname.clone();
        config.channels = network.channels.clone();
        config.owners = network.owners.clone();
        config.command_prefix = bot.command_prefix;
        config.quit_message = bot.quit_message.clone();
        config
    }

    /// `nick@host:port`, built from the configured nick.
    pub fn authority(&self) -> String {
        format!("{}@{}:{}", self.nick, self.host, self.port)
    }

    /// `irc://nick@host:port`
    pub fn uri(&self) -> String {
        format!("irc://{}", self.authority())
    }

    /// Whether `host` is on the owner allowlist.
    pub fn is_owner_host(&self, host: &str) -> bool {
        self.owners.iter().any(|owner| owner == host)
    }
}
