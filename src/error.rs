//! Error hierarchy for the bot core.
//!
//! Connection-level failures ([`ConnectionError`]) are returned from the
//! send API and from each worker; hook failures ([`HandlerError`]) are caught
//! by the dispatcher and only ever logged.

use ircore_proto::ProtocolError;
use thiserror::Error;

// ============================================================================
// Connection Errors
// ============================================================================

/// Errors from a connection's send API or its worker.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Application traffic attempted before RPL_WELCOME.
    #[error("not registered")]
    NotRegistered,

    /// Framing or outbound validation failure (`LineTooLong` and friends).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection is closing or already closed.
    #[error("connection closed")]
    Closed,

    /// The server sent `ERROR` and dropped the link.
    #[error("server closed the link: {0}")]
    Server(String),

    /// Registration gave up, e.g. every nick tried was in use.
    #[error("registration failed: {0}")]
    Registration(String),

    /// The worker thread panicked outside of hook dispatch.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

// ============================================================================
// Handler Errors (hook processing)
// ============================================================================

/// Errors a hook handler may return.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(ConnectionError::NotRegistered) => "not_registered",
            Self::Connection(ConnectionError::Protocol(_)) => "protocol",
            Self::Connection(_) => "connection",
            Self::MissingArgument(_) => "missing_argument",
            Self::Internal(_) => "internal",
            Self::Other(_) => "other",
        }
    }
}

/// Result type for hook handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Manager Errors
// ============================================================================

/// Errors from [`crate::manager::ConnectionManager::start`].
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("connection {0:?} is already running")]
    DuplicateConnection(String),

    #[error("failed to spawn worker for {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
