//! Message origin (`:nick!user@host`).
//!
//! Every component is optional: server-origin lines usually carry only a
//! host, and some servers send bare nicks or `nick@host`.

use std::fmt;

/// Origin of a message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix {
    nick: Option<String>,
    user: Option<String>,
    host: Option<String>,
}

impl Prefix {
    /// Create a full user prefix.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: Some(nick.into()),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }

    /// Create a server-origin prefix carrying only a host.
    pub fn server(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    /// Split a raw prefix (without the leading `:`) into its parts.
    ///
    /// A bare token containing a dot and neither `!` nor `@` is a server
    /// name and lands in `host`; any other bare token is a nick.
    pub fn parse(s: &str) -> Self {
        #[derive(Copy, Clone, Eq, PartialEq)]
        enum Part {
            Name,
            User,
            Host,
        }

        let mut name = String::new();
        let mut user = String::new();
        let mut host = String::new();
        let mut part = Part::Name;
        let mut saw_user = false;
        let mut saw_host = false;

        for c in s.chars() {
            match c {
                '!' if part == Part::Name => {
                    saw_user = true;
                    part = Part::User;
                }
                '@' if part != Part::Host => {
                    saw_host = true;
                    part = Part::Host;
                }
                _ => match part {
                    Part::Name => name.push(c),
                    Part::User => user.push(c),
                    Part::Host => host.push(c),
                },
            }
        }

        if !saw_user && !saw_host && name.contains('.') {
            return Self::server(name);
        }

        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        Self {
            nick: non_empty(name),
            user: if saw_user { non_empty(user) } else { None },
            host: if saw_host { non_empty(host) } else { None },
        }
    }

    /// Nickname, if the origin was a user.
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    /// Username (ident).
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Hostname, or the server name for server-origin lines.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// True when the prefix has only a host.
    pub fn is_server(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_some()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_server() {
            return f.write_str(self.host.as_deref().unwrap_or_default());
        }
        if let Some(nick) = &self.nick {
            f.write_str(nick)?;
        }
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
