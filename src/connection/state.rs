//! Connection lifecycle and the sans-IO session machine.
//!
//! [`Session`] knows what the protocol requires of a client (register,
//! answer PING, track its own nick and channels) but performs no I/O: the
//! event loop feeds it parsed messages and applies the [`SessionEvent`]s it
//! returns.

use std::fmt;

use ircore_proto::Message;

use crate::config::ConnectionConfig;

/// Lifecycle of one connection.
///
/// `Disconnected → Connecting → AwaitingRegistration → Registered →
/// Closing → Disconnected`; any state may jump to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    AwaitingRegistration,
    Registered,
    Closing,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingRegistration => "awaiting_registration",
            Self::Registered => "registered",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the event loop should do in response to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Queue this line ahead of any hook traffic.
    Send(Message),
    /// RPL_WELCOME received; `nick` is what the server calls us.
    Registered { nick: String },
    Joined(String),
    Parted(String),
    Kicked { channel: String, by: Option<String> },
    NickChanged(String),
    /// The server sent `ERROR` and is about to close the link.
    ServerError(String),
    /// Every nick tried during registration was taken.
    NickUnavailable(String),
}

/// How many times `_` is appended to a taken nick before giving up.
pub const MAX_NICK_RETRIES: u8 = 5;

/// Client-side protocol state for one connection.
#[derive(Debug, Clone)]
pub struct Session {
    nick: String,
    username: String,
    realname: String,
    registered: bool,
    nick_retries: u8,
}

impl Session {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            nick: config.nick.clone(),
            username: config.username.clone(),
            realname: config.realname.clone(),
            registered: false,
            nick_retries: 0,
        }
    }

    /// The nick we currently hold (or are trying to register).
    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Registration lines, sent as soon as the socket is up.
    pub fn start(&self) -> Vec<Message> {
        vec![
            Message::nick(&self.nick),
            Message::user(&self.username, &self.realname),
        ]
    }

    fn is_self(&self, msg: &Message) -> bool {
        msg.source_nick()
            .is_some_and(|nick| nick.eq_ignore_ascii_case(&self.nick))
    }

    /// Process one inbound message.
    pub fn feed(&mut self, msg: &Message) -> Vec<SessionEvent> {
        match msg.command() {
            "PING" => vec![SessionEvent::Send(Message::pong_for(msg))],
            "001" => {
                self.registered = true;
                if let Some(nick) = msg.param(0) {
                    self.nick = nick.to_owned();
                }
                vec![SessionEvent::Registered {
                    nick: self.nick.clone(),
                }]
            }
            "433" if !self.registered => {
                if self.nick_retries >= MAX_NICK_RETRIES {
                    return vec![SessionEvent::NickUnavailable(self.nick.clone())];
                }
                self.nick_retries += 1;
                self.nick.push('_');
                vec![SessionEvent::Send(Message::nick(&self.nick))]
            }
            "JOIN" if self.is_self(msg) => msg
                .param(0)
                .map(|chan| vec![SessionEvent::Joined(chan.to_owned())])
                .unwrap_or_default(),
            "PART" if self.is_self(msg) => msg
                .param(0)
                .map(|chan| vec![SessionEvent::Parted(chan.to_owned())])
                .unwrap_or_default(),
            "KICK" => match (msg.param(0), msg.param(1)) {
                (Some(channel), Some(target)) if target.eq_ignore_ascii_case(&self.nick) => {
                    vec![SessionEvent::Kicked {
                        channel: channel.to_owned(),
                        by: msg.source_nick().map(str::to_owned),
                    }]
                }
                _ => Vec::new(),
            },
            "NICK" if self.is_self(msg) => match msg.param(0) {
                Some(nick) => {
                    self.nick = nick.to_owned();
                    vec![SessionEvent::NickChanged(self.nick.clone())]
                }
                None => Vec::new(),
            },
            "ERROR" => vec![SessionEvent::ServerError(msg.text().to_owned())],
            _ => Vec::new(),
        }
    }
}
