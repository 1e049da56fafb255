//! Operator console.
//!
//! A line-oriented REPL over the live connections. Slash commands steer the
//! selected connection; anything else is sent to it verbatim.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use ircore_proto::Message;
use thiserror::Error;
use tracing::{debug, warn};

use crate::connection::{Connection, ConnectionSet};
use crate::error::ConnectionError;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `/exit`
    Exit,
    /// `/select <n>`
    Select(usize),
    /// `/next`
    Next,
    /// `/join <channels> [key]`
    Join { channels: String, key: Option<String> },
    /// `/msg <target> <text>`
    Msg { target: String, text: String },
    /// `/say <text>` to the current channel.
    Say(String),
    /// `/part [reason]` from the current channel.
    Part(Option<String>),
    /// `/setchan <channel>`
    SetChannel(String),
    /// Any other line, sent as-is.
    Raw(String),
    Empty,
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("no connections")]
    NoConnection,
    #[error("invalid index {index} ({count} connections)")]
    InvalidIndex { index: usize, count: usize },
    #[error("no channel set on {0}")]
    NoChannel(String),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Self::Empty);
        }
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        let cmd = match word.to_ascii_lowercase().as_str() {
            "/exit" => Self::Exit,
            "/select" => {
                let index = rest.parse().map_err(|_| ConsoleError::Usage("/select <n>"))?;
                Self::Select(index)
            }
            "/next" => Self::Next,
            "/join" => {
                let mut words = rest.split_whitespace();
                let channels = words.next().ok_or(ConsoleError::Usage("/join <channels> [key]"))?;
                Self::Join {
                    channels: channels.to_owned(),
                    key: words.next().map(str::to_owned),
                }
            }
            "/msg" => match rest.split_once(char::is_whitespace) {
                Some((target, text)) if !text.trim().is_empty() => Self::Msg {
                    target: target.to_owned(),
                    text: text.trim_start().to_owned(),
                },
                _ => return Err(ConsoleError::Usage("/msg <target> <text>")),
            },
            "/say" if rest.is_empty() => return Err(ConsoleError::Usage("/say <text>")),
            "/say" => Self::Say(rest.to_owned()),
            "/part" => Self::Part(Some(rest).filter(|r| !r.is_empty()).map(str::to_owned)),
            "/setchan" => {
                let channel = rest
                    .split_whitespace()
                    .next()
                    .ok_or(ConsoleError::Usage("/setchan <channel>"))?;
                Self::SetChannel(channel.to_owned())
            }
            _ => Self::Raw(line.trim_start().to_owned()),
        };
        Ok(cmd)
    }
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(Option<String>),
    Exit,
}

/// Why [`Console::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Requested,
    InputClosed,
}

/// Console state: the selected connection and a current channel per
/// connection.
#[derive(Debug)]
pub struct Console {
    peers: ConnectionSet,
    selected: usize,
    channels: HashMap<String, String>,
}

impl Console {
    pub fn new(peers: ConnectionSet) -> Self {
        Self {
            peers,
            selected: 0,
            channels: HashMap::new(),
        }
    }

    /// The selected connection. Clamped to the last one if connections have
    /// gone away since it was chosen.
    pub fn selected(&self) -> Option<Connection> {
        let all = self.peers.all();
        let index = self.selected.min(all.len().checked_sub(1)?);
        all.into_iter().nth(index)
    }

    pub fn current_channel(&self, conn: &Connection) -> Option<&str> {
        self.channels.get(conn.id()).map(String::as_str)
    }

    pub fn execute(&mut self, cmd: ConsoleCommand) -> Result<Step, ConsoleError> {
        match cmd {
            ConsoleCommand::Exit => Ok(Step::Exit),
            ConsoleCommand::Empty => Ok(Step::Continue(None)),
            ConsoleCommand::Select(index) => {
                let count = self.peers.len();
                if index >= count {
                    return Err(ConsoleError::InvalidIndex { index, count });
                }
                self.selected = index;
                Ok(Step::Continue(Some(self.banner())))
            }
            ConsoleCommand::Next => {
                let count = self.peers.len();
                self.selected = if count == 0 { 0 } else { (self.selected + 1) % count };
                Ok(Step::Continue(Some(self.banner())))
            }
            cmd => {
                let conn = self.selected().ok_or(ConsoleError::NoConnection)?;
                self.on_connection(&conn, cmd).map(Step::Continue)
            }
        }
    }

    fn on_connection(
        &mut self,
        conn: &Connection,
        cmd: ConsoleCommand,
    ) -> Result<Option<String>, ConsoleError> {
        match cmd {
            ConsoleCommand::Join { channels, key } => {
                match &key {
                    Some(key) => conn.send_message(&Message::join_with_key(&channels, key))?,
                    None => conn.join(&channels)?,
                }
                let first = channels.split(',').next().unwrap_or(&channels).to_owned();
                return Ok(Some(self.set_channel(conn, first)));
            }
            ConsoleCommand::Msg { target, text } => conn.say(&target, &text)?,
            ConsoleCommand::Say(text) => {
                let channel = self.require_channel(conn)?;
                conn.say(&channel, &text)?;
            }
            ConsoleCommand::Part(reason) => {
                let channel = self.require_channel(conn)?;
                conn.part(&channel, reason.as_deref())?;
                self.channels.remove(conn.id());
            }
            ConsoleCommand::SetChannel(channel) => return Ok(Some(self.set_channel(conn, channel))),
            ConsoleCommand::Raw(line) => conn.send(&line)?,
            ConsoleCommand::Exit
            | ConsoleCommand::Empty
            | ConsoleCommand::Select(_)
            | ConsoleCommand::Next => {}
        }
        Ok(None)
    }

    /// Read commands until `/exit` or end of input. Feedback and errors go
    /// to `out`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<ConsoleExit> {
        writeln!(out, "{}", self.banner())?;
        for line in input.lines() {
            let line = line?;
            let step = ConsoleCommand::parse(&line).and_then(|cmd| {
                debug!(command = ?cmd, "Console command");
                self.execute(cmd)
            });
            match step {
                Ok(Step::Exit) => return Ok(ConsoleExit::Requested),
                Ok(Step::Continue(Some(feedback))) => writeln!(out, "{feedback}")?,
                Ok(Step::Continue(None)) => {}
                Err(e) => {
                    warn!(error = %e, "Console command failed");
                    writeln!(out, "error: {e}")?;
                }
            }
            out.flush()?;
        }
        Ok(ConsoleExit::InputClosed)
    }

    fn banner(&self) -> String {
        match self.selected() {
            Some(conn) => format!("talking on [{}] {}", self.selected_index(), conn.authority()),
            None => "no connections".to_owned(),
        }
    }

    fn selected_index(&self) -> usize {
        self.selected.min(self.peers.len().saturating_sub(1))
    }

    fn set_channel(&mut self, conn: &Connection, channel: String) -> String {
        let feedback = format!("talking on channel {channel}");
        self.channels.insert(conn.id().to_owned(), channel);
        feedback
    }

    fn require_channel(&self, conn: &Connection) -> Result<String, ConsoleError> {
        self.current_channel(conn)
            .map(str::to_owned)
            .ok_or_else(|| ConsoleError::NoChannel(conn.id().to_owned()))
    }
}
