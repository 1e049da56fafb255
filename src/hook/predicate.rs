//! Hook predicates.
//!
//! A hook fires only when every one of its predicates holds. Each predicate
//! is a pure test over the message and the static facts of the connection it
//! arrived on (see [`Subject`]). There is no OR or NOT; a hook that needs OR
//! is registered twice with the same handler.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use ircore_proto::Message;
use thiserror::Error;

use crate::config::ConnectionConfig;

/// Errors building a predicate.
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("unknown field: {0:?}")]
    UnknownField(String),

    #[error("invalid glob {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid regex {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Field-extraction keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The whole line as received.
    Raw,
    /// Command token as received (`PRIVMSG`, `001`).
    Command,
    /// Command with numerics resolved to mnemonics.
    Symbolic,
    /// Bot command word, e.g. `!say`.
    MessageCommand,
    /// The last parameter.
    Message,
    /// `nick!user@host` reconstructed from the prefix.
    Prefix,
    Nick,
    User,
    Host,
    /// Configured server hostname.
    ServerHost,
    /// `nick@host:port`
    ServerName,
    /// `irc://nick@host:port`
    ServerUri,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Raw,
        Field::Command,
        Field::Symbolic,
        Field::MessageCommand,
        Field::Message,
        Field::Prefix,
        Field::Nick,
        Field::User,
        Field::Host,
        Field::ServerHost,
        Field::ServerName,
        Field::ServerUri,
    ];

    /// The key as written in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Raw => "raw",
            Field::Command => "command",
            Field::Symbolic => "symbolic",
            Field::MessageCommand => "message_command",
            Field::Message => "message",
            Field::Prefix => "prefix",
            Field::Nick => "nick",
            Field::User => "user",
            Field::Host => "host",
            Field::ServerHost => "serverhost",
            Field::ServerName => "servername",
            Field::ServerUri => "serveruri",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| PredicateError::UnknownField(s.to_owned()))
    }
}

/// What predicates are evaluated against: a message plus the static facts
/// of the connection it arrived on.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub message: &'a Message,
    pub config: &'a ConnectionConfig,
    /// Cached `config.authority()`.
    pub authority: &'a str,
}

impl<'a> Subject<'a> {
    pub fn new(message: &'a Message, config: &'a ConnectionConfig, authority: &'a str) -> Self {
        Self {
            message,
            config,
            authority,
        }
    }

    /// Extract a field. `None` means the message has no such part (no
    /// prefix, no bot command), which makes any test on it fail.
    pub fn extract(&self, field: Field) -> Option<Cow<'a, str>> {
        let msg = self.message;
        let prefix = msg.prefix();
        Some(match field {
            Field::Raw => Cow::Borrowed(msg.raw()),
            Field::Command => Cow::Borrowed(msg.command()),
            Field::Symbolic => Cow::Borrowed(msg.symbolic()),
            Field::MessageCommand => Cow::Borrowed(msg.message_command(self.config.command_prefix)?),
            Field::Message => Cow::Borrowed(msg.text()),
            Field::Prefix => Cow::Owned(prefix?.to_string()),
            Field::Nick => Cow::Borrowed(prefix?.nick()?),
            Field::User => Cow::Borrowed(prefix?.user()?),
            Field::Host => Cow::Borrowed(prefix?.host()?),
            Field::ServerHost => Cow::Borrowed(self.config.host.as_str()),
            Field::ServerName => Cow::Borrowed(self.authority),
            Field::ServerUri => Cow::Owned(format!("irc://{}", self.authority)),
        })
    }
}

/// One condition of a hook.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field equals the value exactly.
    Equal(Field, String),
    /// Shell-style glob over the whole field, case-sensitive.
    Glob(Field, glob::Pattern),
    /// Regex found anywhere in the field unless the pattern anchors itself.
    Regex(Field, regex::Regex),
    /// Sender host is on the connection's owner allowlist. Fails closed.
    Owner,
    /// Bot command word equals this (prefix included, e.g. `!say`).
    Command(String),
    /// Message text equals this.
    MessageEquals(String),
    /// Command is `PRIVMSG`.
    Privmsg,
    /// Command is this three-digit numeric.
    Numeric(u16),
    /// Number of whitespace-separated words in the text is within bounds.
    WordCount {
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl Predicate {
    pub fn equal(field: Field, value: impl Into<String>) -> Self {
        Predicate::Equal(field, value.into())
    }

    /// Compile a glob predicate.
    pub fn glob(field: Field, pattern: &str) -> Result<Self, PredicateError> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| PredicateError::Glob {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Predicate::Glob(field, compiled))
    }

    /// Compile a regex predicate.
    pub fn regex(field: Field, pattern: &str) -> Result<Self, PredicateError> {
        let compiled = regex::Regex::new(pattern).map_err(|source| PredicateError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Predicate::Regex(field, compiled))
    }

    pub fn command(word: impl Into<String>) -> Self {
        Predicate::Command(word.into())
    }

    pub fn message_equals(text: impl Into<String>) -> Self {
        Predicate::MessageEquals(text.into())
    }

    pub fn matches(&self, subject: &Subject<'_>) -> bool {
        let msg = subject.message;
        match self {
            Predicate::Equal(field, value) => {
                subject.extract(*field).is_some_and(|v| v == value.as_str())
            }
            Predicate::Glob(field, pattern) => {
                subject.extract(*field).is_some_and(|v| pattern.matches(&v))
            }
            Predicate::Regex(field, re) => subject.extract(*field).is_some_and(|v| re.is_match(&v)),
            Predicate::Owner => msg
                .prefix()
                .and_then(|p| p.host())
                .is_some_and(|host| subject.config.is_owner_host(host)),
            Predicate::Command(word) => {
                msg.message_command(subject.config.command_prefix) == Some(word.as_str())
            }
            Predicate::MessageEquals(text) => msg.text() == text,
            Predicate::Privmsg => msg.command() == "PRIVMSG",
            Predicate::Numeric(code) => msg.numeric() == Some(*code),
            Predicate::WordCount { min, max } => {
                let count = msg.text().split_whitespace().count();
                min.is_none_or(|min| count >= min) && max.is_none_or(|max| count <= max)
            }
        }
    }
}
