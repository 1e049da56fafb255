//! # ircore-proto
//!
//! IRC wire model for the ircore bot core: parsing one protocol line into a
//! [`Message`], serializing it back, the numeric reply table and a tokio
//! line codec.
//!
//! ```rust
//! use ircore_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :hello world".parse().unwrap();
//! assert_eq!(msg.prefix().and_then(|p| p.nick()), Some("nick"));
//! assert_eq!(msg.params(), &["#chan", "hello world"]);
//! assert_eq!(msg.to_string(), ":nick!user@host PRIVMSG #chan :hello world");
//!
//! let reply = Message::privmsg("#chan", "hi");
//! assert_eq!(reply.to_string(), "PRIVMSG #chan :hi");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod chan;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod numeric;
pub mod prefix;

pub use self::chan::ChannelExt;
pub use self::error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::prefix::Prefix;
