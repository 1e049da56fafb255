//! Message dispatch.
//!
//! Every message a connection reads is offered to every hook in a fresh
//! registry snapshot. All hooks whose predicates hold run, in registration
//! order, synchronously on the connection's worker. A handler that fails or
//! panics is logged and the next hook is still offered the message.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use ircore_proto::Message;
use tracing::{debug, error, warn};

use crate::connection::{Connection, ConnectionSet};
use crate::hook::{HookRegistry, Subject};

/// Views of the message handed to each handler, computed once per dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The message text (last parameter, `""` if none).
    pub text: &'a str,
    /// Bot command word, e.g. `!say`.
    pub command: Option<&'a str>,
    /// Text after the command word.
    pub args: &'a str,
    /// Reply target: the channel for channel messages, else the sender.
    pub channel: Option<&'a str>,
    pub command_prefix: char,
    /// All live connections, for sending to other networks.
    pub peers: &'a ConnectionSet,
}

impl<'a> Context<'a> {
    pub fn new(msg: &'a Message, command_prefix: char, peers: &'a ConnectionSet) -> Self {
        Self {
            text: msg.text(),
            command: msg.message_command(command_prefix),
            args: msg.message_args(command_prefix),
            channel: msg.channel(),
            command_prefix,
            peers,
        }
    }
}

/// Outcome of one dispatch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Hooks in the snapshot.
    pub offered: usize,
    /// Hooks whose predicates all held.
    pub matched: usize,
    /// Matched hooks that returned an error or panicked.
    pub failed: usize,
}

/// Routes messages from any connection through the shared registry.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: HookRegistry,
    peers: ConnectionSet,
}

impl Dispatcher {
    pub fn new(registry: HookRegistry, peers: ConnectionSet) -> Self {
        Self { registry, peers }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn peers(&self) -> &ConnectionSet {
        &self.peers
    }

    pub fn dispatch(&self, msg: &Message, origin: &Connection) -> DispatchReport {
        let snapshot = self.registry.snapshot();
        let config = origin.config();
        let subject = Subject::new(msg, config, origin.authority());
        let ctx = Context::new(msg, config.command_prefix, &self.peers);

        let mut report = DispatchReport {
            offered: snapshot.len(),
            ..DispatchReport::default()
        };

        for (id, hook) in snapshot.iter() {
            if !hook.matches(&subject) {
                continue;
            }
            report.matched += 1;
            debug!(connection = %origin.id(), hook = %hook.name(), id = %id, "Hook matched");

            match catch_unwind(AssertUnwindSafe(|| hook.call(origin, msg, &ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        connection = %origin.id(),
                        hook = %hook.name(),
                        id = %id,
                        code = e.error_code(),
                        error = %e,
                        "Hook failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    error!(
                        connection = %origin.id(),
                        hook = %hook.name(),
                        id = %id,
                        panic = %panic_message(payload.as_ref()),
                        "Hook panicked"
                    );
                }
            }
        }

        report
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
