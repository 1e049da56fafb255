//! ircore - a multi-network IRC bot core.
//!
//! Connections register with their networks, read lines, and offer every
//! message to a shared registry of predicate-guarded hooks. Hooks reply
//! through the [`Connection`] they were handed or through any peer in the
//! [`ConnectionSet`].

pub mod config;
pub mod connection;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod hook;
pub mod manager;
pub mod plugins;
pub mod telemetry;

pub use config::{Config, ConnectionConfig};
pub use connection::{Connection, ConnectionSet, ConnectionState};
pub use dispatch::{Context, DispatchReport, Dispatcher};
pub use error::{ConnectionError, HandlerError, HandlerResult, ManagerError};
pub use hook::{Field, Hook, HookId, HookRegistry, Predicate};
pub use ircore_proto::Message;
pub use manager::{ConnectionManager, WorkerExit};
