//! Error types for the protocol crate.
//!
//! [`ProtocolError`] covers framing and outbound validation; parse failures
//! are wrapped in [`ProtocolError::InvalidMessage`] with a
//! [`MessageParseError`] describing what was wrong with the line.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded the maximum allowed length.
    ///
    /// `actual` and `limit` both count the `\r\n` terminator.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Outbound text contained a character that would break framing.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The line that failed to parse.
        string: String,
        /// What went wrong.
        #[source]
        cause: MessageParseError,
    },
}

impl ProtocolError {
    /// Returns the parse failure if this error came from [`crate::Message::parse`].
    pub fn parse_cause(&self) -> Option<&MessageParseError> {
        match self {
            Self::InvalidMessage { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Reasons a single line could not become a [`crate::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// The line was empty or only whitespace.
    #[error("empty message")]
    EmptyMessage,

    /// Tags or prefix were present but no command followed.
    #[error("missing command")]
    MissingCommand,

    /// The `@tags` section was not terminated by a space.
    #[error("unterminated tags section")]
    UnterminatedTags,

    /// The `:prefix` section was empty.
    #[error("invalid prefix: {0:?}")]
    InvalidPrefix(String),
}
