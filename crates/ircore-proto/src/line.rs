//! Line-based codec for tokio.
//!
//! Splits the inbound byte stream on `\n` (with or without a preceding
//! `\r`) and frames outbound lines with `\r\n`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{ProtocolError, Result};

/// Outbound limit, terminator included (RFC 1459 Section 2.3).
pub const MAX_LINE_LEN: usize = 512;

/// Inbound limit: 8191 bytes of IRCv3 tags plus a classic 512-byte line.
pub const MAX_INBOUND_LEN: usize = 8191 + MAX_LINE_LEN;

/// Check a line (without terminator) before it is queued for sending.
///
/// CR, LF and NUL would split or truncate the line on the wire, and anything
/// longer than [`MAX_LINE_LEN`] once `\r\n` is added would be cut by the
/// server.
pub fn validate_outbound(line: &str) -> Result<()> {
    if let Some(c) = line.chars().find(|c| matches!(c, '\r' | '\n' | '\0')) {
        return Err(ProtocolError::IllegalControlChar(c));
    }
    let actual = line.len() + 2;
    if actual > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong {
            actual,
            limit: MAX_LINE_LEN,
        });
    }
    Ok(())
}

/// Line-based codec that handles newline-terminated messages.
///
/// Oversized inbound lines are dropped up to the next newline instead of
/// failing the stream; invalid UTF-8 is replaced with U+FFFD.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum inbound line length
    max_len: usize,
    /// Skipping the remainder of an oversized line
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default inbound limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_INBOUND_LEN)
    }

    /// Create a codec with a custom inbound limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    fn finish_line(bytes: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_end_matches(['\r', '\n']);
        (!text.is_empty()).then(|| text.to_owned())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    if !self.discarding {
                        warn!(len = src.len(), limit = self.max_len, "Discarding oversized line");
                    }
                    self.discarding = true;
                    src.clear();
                    self.next_index = 0;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_len {
                warn!(len = line.len(), limit = self.max_len, "Discarding oversized line");
                continue;
            }
            if let Some(text) = Self::finish_line(&line) {
                return Ok(Some(text));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        let rest = src.split();
        self.next_index = 0;
        if std::mem::take(&mut self.discarding) {
            return Ok(None);
        }
        Ok(Self::finish_line(&rest))
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
        validate_outbound(&line)?;
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
