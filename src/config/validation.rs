//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use ircore_proto::chan::is_valid_channel;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one [[network]] block is required")]
    NoNetworks,
    #[error("network #{0}: host is required")]
    MissingHost(usize),
    #[error("network #{0}: nick is required")]
    MissingNick(usize),
    #[error("network #{index}: nick {nick:?} must not contain spaces")]
    InvalidNick { index: usize, nick: String },
    #[error("network #{0}: port must be non-zero")]
    InvalidPort(usize),
    #[error("network #{index}: {channel:?} is not a valid channel name")]
    InvalidChannel { index: usize, channel: String },
    #[error("bot.command_prefix must not be whitespace")]
    InvalidCommandPrefix,
    #[error("duplicate connection name: {0}")]
    DuplicateName(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.networks.is_empty() {
        errors.push(ValidationError::NoNetworks);
    }
    if config.bot.command_prefix.is_whitespace() {
        errors.push(ValidationError::InvalidCommandPrefix);
    }

    for (index, network) in config.networks.iter().enumerate() {
        if network.host.trim().is_empty() {
            errors.push(ValidationError::MissingHost(index));
        }
        if network.nick.is_empty() {
            errors.push(ValidationError::MissingNick(index));
        } else if network.nick.contains(char::is_whitespace) {
            errors.push(ValidationError::InvalidNick {
                index,
                nick: network.nick.clone(),
            });
        }
        if network.port == 0 {
            errors.push(ValidationError::InvalidPort(index));
        }
        for channel in &network.channels {
            if !is_valid_channel(channel) {
                errors.push(ValidationError::InvalidChannel {
                    index,
                    channel: channel.clone(),
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for conn in config.connections() {
        if !seen.insert(conn.name.clone()) {
            errors.push(ValidationError::DuplicateName(conn.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::parse(
            "[[network]]\nhost = \"irc.example.net\"\nnick = \"bot\"\nchannels = [\"#a\", \"&b\"]\n",
        )
        .unwrap();
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(validate(&config), Err(vec![ValidationError::NoNetworks]));
    }

    #[test]
    fn test_collects_every_problem() {
        let config = Config::parse(
            r#"
[bot]
command_prefix = " "

[[network]]
host = ""
port = 0
nick = "two words"
channels = ["nochan"]

[[network]]
host = "h"
nick = "n"
name = "dup"

[[network]]
host = "h2"
nick = "n2"
name = "dup"
"#,
        )
        .unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidCommandPrefix,
                ValidationError::MissingHost(0),
                ValidationError::InvalidNick {
                    index: 0,
                    nick: "two words".into()
                },
                ValidationError::InvalidPort(0),
                ValidationError::InvalidChannel {
                    index: 0,
                    channel: "nochan".into()
                },
                ValidationError::DuplicateName("dup".into()),
            ]
        );
    }
}
