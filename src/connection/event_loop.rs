//! Per-connection I/O.
//!
//! The reader decodes lines, feeds them to the [`Session`], applies the
//! resulting events and then dispatches the message to hooks, one message
//! at a time. A spawned writer drains the outbound queue onto the socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ircore_proto::{LineCodec, Message};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::state::{ConnectionState, Session, SessionEvent};
use super::{Connection, Outbound};
use crate::dispatch::Dispatcher;
use crate::error::ConnectionError;

/// How long the final QUIT may take before the socket is dropped anyway.
const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

type LineSink = FramedWrite<OwnedWriteHalf, LineCodec>;

/// Why the read loop ended without an error.
enum Exit {
    /// `stop()` was called.
    Stopped,
    /// The server closed the socket or sent ERROR after we asked to quit.
    Closed,
}

/// Run one connection to completion.
///
/// Returns `Ok` when the connection was stopped or quit on request, and the
/// failure otherwise (connect error, unexpected EOF, server ERROR).
pub(crate) async fn run(
    conn: Connection,
    outbound: Outbound,
    dispatcher: Dispatcher,
) -> Result<(), ConnectionError> {
    let token = conn.shutdown_token().clone();
    conn.set_state(ConnectionState::Connecting);

    let config = conn.config();
    let connect = TcpStream::connect((config.host.as_str(), config.port));
    let stream = tokio::select! {
        _ = token.cancelled() => {
            conn.set_state(ConnectionState::Disconnected);
            return Ok(());
        }
        res = connect => res,
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            warn!(connection = %conn.id(), error = %e, "Connect failed");
            token.cancel();
            conn.set_state(ConnectionState::Disconnected);
            return Err(e.into());
        }
    };

    let result = drive(&conn, stream, outbound, &dispatcher, &token).await;

    token.cancel();
    conn.clear_channels();
    conn.set_state(ConnectionState::Disconnected);
    result
}

async fn drive(
    conn: &Connection,
    stream: TcpStream,
    outbound: Outbound,
    dispatcher: &Dispatcher,
    token: &CancellationToken,
) -> Result<(), ConnectionError> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(connection = %conn.id(), error = %e, "Failed to set TCP_NODELAY");
    }
    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(read_half, LineCodec::new());
    let sink = FramedWrite::new(write_half, LineCodec::new());

    conn.set_state(ConnectionState::AwaitingRegistration);
    let mut session = Session::new(conn.config());
    for msg in session.start() {
        conn.enqueue(&msg)?;
    }

    let mut writer = tokio::spawn(write_loop(sink, outbound.into_inner(), token.clone()));
    let mut writer_done = false;

    let outcome = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break Ok(Exit::Stopped),
            done = &mut writer => {
                writer_done = true;
                match done {
                    Ok((_, Err(e))) => break Err(e),
                    Ok((_, Ok(()))) => break Ok(Exit::Closed),
                    Err(e) => break Err(ConnectionError::WorkerPanicked(e.to_string())),
                }
            }
            frame = lines.next() => match frame {
                Some(Ok(line)) => {
                    if let Some(exit) = handle_line(conn, &mut session, dispatcher, &line) {
                        break exit;
                    }
                }
                Some(Err(e)) => break Err(e.into()),
                None => {
                    break if conn.quit_requested() {
                        Ok(Exit::Closed)
                    } else {
                        Err(ConnectionError::Closed)
                    };
                }
            },
        }
    };

    let was_registered = conn.is_registered();
    conn.set_state(ConnectionState::Closing);
    token.cancel();

    if !writer_done {
        match writer.await {
            Ok((mut sink, _)) => {
                if matches!(outcome, Ok(Exit::Stopped)) && was_registered {
                    send_final_quit(conn, &mut sink).await;
                }
            }
            Err(e) => warn!(connection = %conn.id(), error = %e, "Writer task failed"),
        }
    }

    match outcome {
        Ok(Exit::Stopped) => {
            info!(connection = %conn.id(), "Stopped");
            Ok(())
        }
        Ok(Exit::Closed) => {
            info!(connection = %conn.id(), "Connection closed");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Returns `Some` when the connection should close.
fn handle_line(
    conn: &Connection,
    session: &mut Session,
    dispatcher: &Dispatcher,
    line: &str,
) -> Option<Result<Exit, ConnectionError>> {
    trace!(connection = %conn.id(), line = %line, "recv");

    let msg = match Message::parse(line) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(connection = %conn.id(), error = %e, "Dropping unparsable line");
            return None;
        }
    };

    let mut server_error = None;
    for event in session.feed(&msg) {
        if let Err(e) = apply(conn, event, &mut server_error) {
            return Some(Err(e));
        }
    }

    let report = dispatcher.dispatch(&msg, conn);
    if report.matched > 0 {
        debug!(
            connection = %conn.id(),
            command = %msg.symbolic(),
            matched = report.matched,
            failed = report.failed,
            "Dispatched"
        );
    }

    server_error.map(|text| {
        if conn.quit_requested() {
            Ok(Exit::Closed)
        } else {
            Err(ConnectionError::Server(text))
        }
    })
}

fn apply(
    conn: &Connection,
    event: SessionEvent,
    server_error: &mut Option<String>,
) -> Result<(), ConnectionError> {
    match event {
        SessionEvent::Send(msg) => enqueue_internal(conn, &msg)?,
        SessionEvent::Registered { nick } => {
            conn.set_nick(&nick);
            conn.set_state(ConnectionState::Registered);
            info!(connection = %conn.id(), nick = %nick, "Registered");
            for channel in &conn.config().channels {
                enqueue_internal(conn, &Message::join(channel))?;
            }
        }
        SessionEvent::Joined(channel) => {
            info!(connection = %conn.id(), channel = %channel, "Joined");
            conn.add_channel(&channel);
        }
        SessionEvent::Parted(channel) => {
            info!(connection = %conn.id(), channel = %channel, "Parted");
            conn.remove_channel(&channel);
        }
        SessionEvent::Kicked { channel, by } => {
            info!(connection = %conn.id(), channel = %channel, by = ?by, "Kicked");
            conn.remove_channel(&channel);
        }
        SessionEvent::NickChanged(nick) => {
            info!(connection = %conn.id(), nick = %nick, "Nick changed");
            conn.set_nick(&nick);
        }
        SessionEvent::ServerError(text) => {
            warn!(connection = %conn.id(), error = %text, "Server sent ERROR");
            *server_error = Some(text);
        }
        SessionEvent::NickUnavailable(nick) => {
            warn!(connection = %conn.id(), nick = %nick, "No free nick, giving up");
            return Err(ConnectionError::Registration(format!("nickname {nick} is in use")));
        }
    }
    Ok(())
}

/// Queue protocol traffic the session generated. A line that fails outbound
/// validation is dropped; only a closed queue ends the connection.
fn enqueue_internal(conn: &Connection, msg: &Message) -> Result<(), ConnectionError> {
    match conn.enqueue(msg) {
        Err(ConnectionError::Protocol(e)) => {
            warn!(
                connection = %conn.id(),
                command = %msg.command(),
                error = %e,
                "Dropping invalid outbound line"
            );
            Ok(())
        }
        other => other,
    }
}

/// Drain the queue onto the socket until cancelled. Lines still queued at
/// cancellation are dropped. The sink is handed back for the final QUIT.
async fn write_loop(
    mut sink: LineSink,
    mut rx: UnboundedReceiver<String>,
    token: CancellationToken,
) -> (LineSink, Result<(), ConnectionError>) {
    let result = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break Ok(()),
            next = rx.recv() => {
                let Some(line) = next else { break Ok(()) };
                trace!(line = %line, "send");
                if let Err(e) = sink.send(line).await {
                    break Err(e.into());
                }
            }
        }
    };
    (sink, result)
}

async fn send_final_quit(conn: &Connection, sink: &mut LineSink) {
    let quit = Message::quit(&conn.config().quit_message);
    match tokio::time::timeout(QUIT_TIMEOUT, sink.send(quit.raw().to_owned())).await {
        Ok(Ok(())) => debug!(connection = %conn.id(), "Sent QUIT"),
        Ok(Err(e)) => debug!(connection = %conn.id(), error = %e, "QUIT not delivered"),
        Err(_) => debug!(connection = %conn.id(), "QUIT timed out"),
    }
}
