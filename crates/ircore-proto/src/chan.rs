//! Channel name utilities.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Sigils that mark a message target as a channel.
pub const CHANNEL_SIGILS: [char; 2] = ['#', '&'];

/// Extension trait for checking if a string names a channel.
pub trait ChannelExt {
    /// True when the string starts with a channel sigil (`#` or `&`).
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        self.starts_with(CHANNEL_SIGILS)
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}

/// True when `name` is usable in a JOIN: a sigil followed by at least one
/// character, with no space, comma, BEL or NUL, at most 50 characters.
pub fn is_valid_channel(name: &str) -> bool {
    name.is_channel_name()
        && name.chars().count() > 1
        && name.chars().count() <= 50
        && !name
            .chars()
            .any(|c| c == ' ' || c == ',' || c == '\x07' || c == '\0' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigils() {
        assert!("#rust".is_channel_name());
        assert!("&local".is_channel_name());
        assert!(!"nick".is_channel_name());
        assert!(!"".is_channel_name());
    }

    #[test]
    fn test_valid_channel() {
        assert!(is_valid_channel("#ircore"));
        assert!(!is_valid_channel("#"));
        assert!(!is_valid_channel("#a,b"));
        assert!(!is_valid_channel("#with space"));
        assert!(!is_valid_channel(&format!("#{}", "x".repeat(50))));
    }
}
