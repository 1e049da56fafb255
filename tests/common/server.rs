//! Scripted IRC server.
//!
//! Listens on an ephemeral localhost port and lets a test play the server
//! side of one connection line by line.

use std::time::Duration;

use ircore::ConnectionConfig;
use ircore_proto::Message;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A listening fake server.
pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Connection config pointing at this server.
    pub fn config(&self, nick: &str) -> ConnectionConfig {
        let mut config = ConnectionConfig::new("127.0.0.1", self.port(), nick);
        config.owners = vec!["user/owner".to_string()];
        config.quit_message = "test over".to_string();
        config
    }

    /// Wait for the bot to connect.
    pub async fn accept(&self) -> anyhow::Result<Peer> {
        let (stream, _) = timeout(RECV_TIMEOUT, self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(Peer {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }
}

/// The server end of one accepted connection.
pub struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Peer {
    /// Send a raw line; the terminator is added.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the bot.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        if !line.ends_with("\r\n") {
            anyhow::bail!("line not CRLF terminated: {line:?}");
        }
        Message::parse(&line).map_err(|e| anyhow::anyhow!("Parse error: {e}"))
    }

    /// Skip lines until one with `command` arrives.
    #[allow(dead_code)]
    pub async fn recv_command(&mut self, command: &str) -> anyhow::Result<Message> {
        loop {
            let msg = self.recv().await?;
            if msg.command().eq_ignore_ascii_case(command) {
                return Ok(msg);
            }
        }
    }

    /// Read the NICK/USER pair and answer with RPL_WELCOME.
    pub async fn register(&mut self) -> anyhow::Result<String> {
        let nick = self.recv().await?;
        anyhow::ensure!(nick.command() == "NICK", "expected NICK, got {}", nick.raw());
        let user = self.recv().await?;
        anyhow::ensure!(user.command() == "USER", "expected USER, got {}", user.raw());

        let nick = nick.param(0).unwrap_or_default().to_string();
        self.send_raw(&format!(":irc.test 001 {nick} :Welcome to the test network {nick}"))
            .await?;
        Ok(nick)
    }

    /// True once the bot has closed its end.
    #[allow(dead_code)]
    pub async fn closed(&mut self) -> anyhow::Result<bool> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await??;
            if n == 0 {
                return Ok(true);
            }
        }
    }
}
