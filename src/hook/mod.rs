//! Hooks: predicate-guarded handlers.
//!
//! ```ignore
//! let id = registry.register(
//!     Hook::new("greet", |conn, _msg, ctx| {
//!         if let Some(target) = ctx.channel {
//!             conn.say(target, "hello")?;
//!         }
//!         Ok(())
//!     })
//!     .when(Predicate::Privmsg)
//!     .when(Predicate::command("!hello")),
//! );
//! ```

pub mod predicate;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use ircore_proto::Message;

use crate::connection::Connection;
use crate::dispatch::Context;
use crate::error::HandlerResult;

pub use predicate::{Field, Predicate, PredicateError, Subject};
pub use registry::{HookId, HookRegistry, Snapshot};

/// Handler signature. Runs on the worker thread of the connection the
/// message arrived on.
pub type Handler = Arc<dyn Fn(&Connection, &Message, &Context<'_>) -> HandlerResult + Send + Sync>;

/// A named handler plus the predicates that must all hold for it to run.
///
/// An empty predicate list matches every message.
#[derive(Clone)]
pub struct Hook {
    name: String,
    predicates: Vec<Predicate>,
    handler: Handler,
}

impl Hook {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Connection, &Message, &Context<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicates: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Add a predicate.
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when every predicate holds.
    pub fn matches(&self, subject: &Subject<'_>) -> bool {
        self.predicates.iter().all(|p| p.matches(subject))
    }

    pub(crate) fn call(&self, conn: &Connection, msg: &Message, ctx: &Context<'_>) -> HandlerResult {
        (self.handler)(conn, msg, ctx)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("predicates", &self.predicates)
            .finish_non_exhaustive()
    }
}
