//! One network session.
//!
//! [`Connection`] is a cheap handle shared between the worker that owns the
//! socket, the hooks it dispatches to and any peer connection's hooks. All
//! outbound traffic goes through one unbounded FIFO drained by a single
//! writer task, so lines never interleave and enqueueing never blocks.

mod event_loop;
mod set;
pub mod state;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ircore_proto::Message;
use ircore_proto::line::validate_outbound;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::error::ConnectionError;

pub(crate) use event_loop::run;
pub use set::ConnectionSet;
pub use state::{ConnectionState, Session, SessionEvent};

/// Receiving end of a connection's write queue, owned by its writer task.
pub(crate) struct Outbound(mpsc::UnboundedReceiver<String>);

impl Outbound {
    pub(crate) fn into_inner(self) -> mpsc::UnboundedReceiver<String> {
        self.0
    }
}

struct Inner {
    config: ConnectionConfig,
    authority: String,
    state: RwLock<ConnectionState>,
    nick: RwLock<String>,
    channels: RwLock<BTreeSet<String>>,
    outbound: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
    quit_requested: AtomicBool,
}

/// Handle to one IRC connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    pub(crate) fn new(config: ConnectionConfig) -> (Self, Outbound) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            inner: Arc::new(Inner {
                authority: config.authority(),
                nick: RwLock::new(config.nick.clone()),
                config,
                state: RwLock::new(ConnectionState::Disconnected),
                channels: RwLock::new(BTreeSet::new()),
                outbound: tx,
                shutdown: CancellationToken::new(),
                quit_requested: AtomicBool::new(false),
            }),
        };
        (conn, Outbound(rx))
    }

    /// Connection name, used as its id in logs and in [`ConnectionSet`].
    pub fn id(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// `nick@host:port` from the configured nick.
    pub fn authority(&self) -> &str {
        &self.inner.authority
    }

    /// `irc://nick@host:port`
    pub fn uri(&self) -> String {
        format!("irc://{}", self.inner.authority)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    pub fn is_registered(&self) -> bool {
        self.state() == ConnectionState::Registered
    }

    /// Current nick; differs from the configured one after a collision or
    /// a NICK change.
    pub fn nick(&self) -> String {
        self.inner.nick.read().clone()
    }

    /// Channels the server has confirmed we are in, sorted.
    pub fn channels(&self) -> Vec<String> {
        self.inner.channels.read().iter().cloned().collect()
    }

    pub fn in_channel(&self, channel: &str) -> bool {
        self.inner.channels.read().contains(channel)
    }

    /// `PRIVMSG target :text`
    pub fn say(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_message(&Message::privmsg(target, text))
    }

    /// `NOTICE target :text`
    pub fn notice(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_message(&Message::notice(target, text))
    }

    /// CTCP ACTION (`/me`).
    pub fn me(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_message(&Message::action(target, text))
    }

    /// Join a channel. Membership is tracked once the server echoes the JOIN.
    pub fn join(&self, channel: &str) -> Result<(), ConnectionError> {
        self.send_message(&Message::join(channel))
    }

    pub fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), ConnectionError> {
        self.send_message(&Message::part(channel, reason))
    }

    /// Ask the server to close the link. The worker then ends cleanly.
    pub fn quit(&self, reason: &str) -> Result<(), ConnectionError> {
        let msg = Message::quit(reason);
        self.ensure_registered()?;
        validate_outbound(msg.raw())?;
        // Set before the line is queued so the server's ERROR reply can never
        // be read ahead of it.
        self.inner.quit_requested.store(true, Ordering::Release);
        if let Err(e) = self.push(msg.raw().to_owned()) {
            self.inner.quit_requested.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }

    /// Queue a raw protocol line (no terminator).
    pub fn send(&self, line: &str) -> Result<(), ConnectionError> {
        self.ensure_registered()?;
        validate_outbound(line)?;
        self.push(line.to_owned())
    }

    pub fn send_message(&self, msg: &Message) -> Result<(), ConnectionError> {
        self.send(msg.raw())
    }

    /// Request shutdown. The worker leaves its read loop, drops pending
    /// writes and, if registered, sends a final QUIT.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    fn ensure_registered(&self) -> Result<(), ConnectionError> {
        match self.state() {
            ConnectionState::Registered => Ok(()),
            ConnectionState::Closing => Err(ConnectionError::Closed),
            _ if self.is_stopping() => Err(ConnectionError::Closed),
            _ => Err(ConnectionError::NotRegistered),
        }
    }

    fn push(&self, line: String) -> Result<(), ConnectionError> {
        self.inner
            .outbound
            .send(line)
            .map_err(|_| ConnectionError::Closed)
    }

    /// Queue protocol traffic regardless of registration state.
    pub(crate) fn enqueue(&self, msg: &Message) -> Result<(), ConnectionError> {
        validate_outbound(msg.raw())?;
        self.push(msg.raw().to_owned())
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        let prev = std::mem::replace(&mut *self.inner.state.write(), next);
        if prev != next {
            info!(connection = %self.id(), from = %prev, to = %next, "State transition");
        }
    }

    pub(crate) fn set_nick(&self, nick: &str) {
        *self.inner.nick.write() = nick.to_owned();
    }

    pub(crate) fn add_channel(&self, channel: &str) {
        self.inner.channels.write().insert(channel.to_owned());
    }

    pub(crate) fn remove_channel(&self, channel: &str) {
        self.inner.channels.write().remove(channel);
    }

    pub(crate) fn clear_channels(&self) {
        self.inner.channels.write().clear();
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.inner.quit_requested.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("authority", &self.authority())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
