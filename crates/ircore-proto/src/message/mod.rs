//! The parsed IRC message and its derived views.
//!
//! A [`Message`] is immutable once built. Everything a hook might want to
//! match on (symbolic command, the human-readable text, the bot-command
//! word, the reply channel) is computed from the stored fields on demand.
//!
//! ```
//! use ircore_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :.hi there".parse().unwrap();
//! assert_eq!(msg.text(), ".hi there");
//! assert_eq!(msg.message_command('.'), Some(".hi"));
//! assert_eq!(msg.message_args('.'), "there");
//! assert_eq!(msg.channel(), Some("#chan"));
//! ```

mod parse;
mod serialize;

use std::str::FromStr;

use crate::chan::ChannelExt;
use crate::error::{ProtocolError, Result};
use crate::numeric;
use crate::prefix::Prefix;

use self::parse::{strip_terminator, ParsedMessage};

/// One IRC protocol line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    raw: String,
    tags: Option<String>,
    prefix: Option<Prefix>,
    command: String,
    params: Vec<String>,
    trailing: bool,
}

impl Message {
    /// Parse one line. A single trailing `\r\n` or `\n` is ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let line = strip_terminator(line);
        let parsed = ParsedMessage::parse(line).map_err(|cause| ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause,
        })?;

        Ok(Self {
            raw: line.to_owned(),
            tags: parsed.tags.map(str::to_owned),
            prefix: parsed.prefix.map(Prefix::parse),
            command: parsed.command.to_owned(),
            params: parsed.params.iter().map(|p| (*p).to_owned()).collect(),
            trailing: parsed.trailing,
        })
    }

    /// Build an outbound message. The last parameter is written in trailing
    /// form when it has to be (empty, contains a space, starts with `:`).
    pub fn build<I, S>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        let trailing = params
            .last()
            .is_some_and(|p| p.is_empty() || p.contains(' ') || p.starts_with(':'));
        Self::assemble(command, params, trailing)
    }

    /// Build an outbound message whose last parameter is always written
    /// with a leading `:`.
    pub fn with_trailing<I, S>(command: &str, middle: I, trailing: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params: Vec<String> = middle.into_iter().map(Into::into).collect();
        params.push(trailing.into());
        Self::assemble(command, params, true)
    }

    fn assemble(command: &str, params: Vec<String>, trailing: bool) -> Self {
        let mut msg = Self {
            raw: String::new(),
            tags: None,
            prefix: None,
            command: command.to_owned(),
            params,
            trailing,
        };
        msg.raw = msg.to_string();
        msg
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::with_trailing("PRIVMSG", [target], text)
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(target: &str, text: &str) -> Self {
        Self::with_trailing("NOTICE", [target], text)
    }

    /// CTCP ACTION, rendered by clients as `* nick text`.
    pub fn action(target: &str, text: &str) -> Self {
        Self::privmsg(target, &format!("\x01ACTION {text}\x01"))
    }

    /// `JOIN <channel>`
    pub fn join(channel: &str) -> Self {
        Self::build("JOIN", [channel])
    }

    /// `JOIN <channels> <keys>`
    pub fn join_with_key(channels: &str, key: &str) -> Self {
        Self::build("JOIN", [channels, key])
    }

    /// `PART <channel> [:reason]`
    pub fn part(channel: &str, reason: Option<&str>) -> Self {
        match reason {
            Some(reason) => Self::with_trailing("PART", [channel], reason),
            None => Self::build("PART", [channel]),
        }
    }

    /// `NICK <nick>`
    pub fn nick(nick: &str) -> Self {
        Self::build("NICK", [nick])
    }

    /// `USER <username> * * :<realname>`
    pub fn user(username: &str, realname: &str) -> Self {
        Self::with_trailing("USER", [username, "*", "*"], realname)
    }

    /// `QUIT :<reason>`
    pub fn quit(reason: &str) -> Self {
        Self::with_trailing("QUIT", std::iter::empty::<String>(), reason)
    }

    /// `PONG :<token>`
    pub fn pong(token: &str) -> Self {
        Self::with_trailing("PONG", std::iter::empty::<String>(), token)
    }

    /// Reply to a `PING`, echoing its parameters in the same form.
    pub fn pong_for(ping: &Message) -> Self {
        Self::assemble("PONG", ping.params.clone(), ping.trailing)
    }

    /// Original line without its terminator.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Raw IRCv3 tag section without the leading `@`.
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// Look up one tag. The value is returned as received, escapes intact; a key
    /// present without `=` yields an empty string.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_deref()?.split(';').find_map(|kv| match kv.split_once('=') {
            Some((k, v)) if k == key => Some(v),
            None if kv == key => Some(""),
            _ => None,
        })
    }

    /// Message origin, if the line had one.
    pub fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// Nick of the sender.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref()?.nick()
    }

    /// Command token as received, e.g. `PRIVMSG` or `001`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Numeric commands mapped to their mnemonic (`001` → `RPL_WELCOME`);
    /// anything else is returned unchanged.
    pub fn symbolic(&self) -> &str {
        self.numeric()
            .and_then(numeric::symbolic)
            .unwrap_or(self.command.as_str())
    }

    /// The numeric code when the command is three digits.
    pub fn numeric(&self) -> Option<u16> {
        numeric::parse_code(&self.command)
    }

    /// All parameters, trailing included.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Whether the last parameter was written with a leading `:`.
    pub fn has_trailing(&self) -> bool {
        self.trailing
    }

    /// The human-readable payload: the last parameter, or `""`.
    pub fn text(&self) -> &str {
        self.params.last().map_or("", String::as_str)
    }

    /// First word of [`Self::text`] when the text starts with `prefix`.
    pub fn message_command(&self, prefix: char) -> Option<&str> {
        let text = self.text();
        if !text.starts_with(prefix) {
            return None;
        }
        text.split_whitespace().next()
    }

    /// Text after the command word, leading whitespace removed. Empty when
    /// there is no command word.
    pub fn message_args(&self, prefix: char) -> &str {
        match self.message_command(prefix) {
            Some(cmd) => self.text()[cmd.len()..].trim_start(),
            None => "",
        }
    }

    /// Where a reply should go: the target channel of a channel
    /// PRIVMSG/NOTICE, otherwise the sender's nick.
    pub fn channel(&self) -> Option<&str> {
        if matches!(self.command.as_str(), "PRIVMSG" | "NOTICE") {
            if let Some(target) = self.params.first() {
                if target.is_channel_name() {
                    return Some(target.as_str());
                }
            }
        }
        self.source_nick()
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageParseError;

    #[test]
    fn test_privmsg_example() {
        let m = Message::parse(":nick!user@host PRIVMSG #chan :hello world").unwrap();
        let p = m.prefix().unwrap();
        assert_eq!(p.nick(), Some("nick"));
        assert_eq!(p.user(), Some("user"));
        assert_eq!(p.host(), Some("host"));
        assert_eq!(m.command(), "PRIVMSG");
        assert_eq!(m.params(), &["#chan", "hello world"]);
        assert_eq!(m.text(), "hello world");
        assert_eq!(m.raw(), ":nick!user@host PRIVMSG #chan :hello world");
    }

    #[test]
    fn test_command_prefix_extraction() {
        let m = Message::parse(":n!u@h PRIVMSG #c :.hi there").unwrap();
        assert_eq!(m.message_command('.'), Some(".hi"));
        assert_eq!(m.message_args('.'), "there");

        let plain = Message::parse(":n!u@h PRIVMSG #c :hi there").unwrap();
        assert_eq!(plain.message_command('.'), None);
        assert_eq!(plain.message_args('.'), "");
    }

    #[test]
    fn test_message_args_collapses_leading_whitespace() {
        let m = Message::parse(":n!u@h PRIVMSG #c :!say   #x  hello").unwrap();
        assert_eq!(m.message_command('!'), Some("!say"));
        assert_eq!(m.message_args('!'), "#x  hello");

        let bare = Message::parse(":n!u@h PRIVMSG #c :!ping").unwrap();
        assert_eq!(bare.message_args('!'), "");
    }

    #[test]
    fn test_symbolic_numeric() {
        let welcome = Message::parse(":irc.example.net 001 bot :Welcome").unwrap();
        assert_eq!(welcome.symbolic(), "RPL_WELCOME");
        assert_eq!(welcome.numeric(), Some(1));

        let unknown = Message::parse(":irc.example.net 999 bot :?").unwrap();
        assert_eq!(unknown.symbolic(), "999");

        let ping = Message::parse("PING :x").unwrap();
        assert_eq!(ping.symbolic(), "PING");
        assert_eq!(ping.numeric(), None);
    }

    #[test]
    fn test_empty_trailing_is_present() {
        let m = Message::parse("PRIVMSG #c :").unwrap();
        assert_eq!(m.params(), &["#c", ""]);
        assert!(m.has_trailing());
        assert_eq!(m.text(), "");
    }

    #[test]
    fn test_bare_command() {
        let m = Message::parse("QUIT").unwrap();
        assert!(m.params().is_empty());
        assert_eq!(m.text(), "");
        assert!(m.prefix().is_none());
    }

    #[test]
    fn test_channel_derivation() {
        let chan = Message::parse(":a!b@c PRIVMSG &local :x").unwrap();
        assert_eq!(chan.channel(), Some("&local"));

        let private = Message::parse(":a!b@c PRIVMSG bot :x").unwrap();
        assert_eq!(private.channel(), Some("a"));

        let notice = Message::parse(":a!b@c NOTICE #n :x").unwrap();
        assert_eq!(notice.channel(), Some("#n"));

        let join = Message::parse(":a!b@c JOIN #j").unwrap();
        assert_eq!(join.channel(), Some("a"));

        let server = Message::parse(":irc.example.net NOTICE * :hi").unwrap();
        assert_eq!(server.channel(), None);
    }

    #[test]
    fn test_tags() {
        let m = Message::parse("@time=2024-01-01T00:00:00Z;flag :a!b@c PRIVMSG #c :x").unwrap();
        assert_eq!(m.tag("time"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(m.tag("flag"), Some(""));
        assert_eq!(m.tag("missing"), None);
        assert_eq!(m.tags(), Some("time=2024-01-01T00:00:00Z;flag"));
    }

    #[test]
    fn test_terminators_are_stripped() {
        let crlf = Message::parse("PING :token\r\n").unwrap();
        let lf = Message::parse("PING :token\n").unwrap();
        assert_eq!(crlf.raw(), "PING :token");
        assert_eq!(crlf, lf);
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = Message::parse(":only.prefix").unwrap_err();
        assert_eq!(err.parse_cause(), Some(&MessageParseError::MissingCommand));
        assert!(err.to_string().contains(":only.prefix"));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Message::privmsg("#c", "hi").to_string(), "PRIVMSG #c :hi");
        assert_eq!(Message::notice("n", "x y").to_string(), "NOTICE n :x y");
        assert_eq!(
            Message::action("#c", "waves").to_string(),
            "PRIVMSG #c :\x01ACTION waves\x01"
        );
        assert_eq!(Message::join("#c").to_string(), "JOIN #c");
        assert_eq!(Message::join_with_key("#c", "key").to_string(), "JOIN #c key");
        assert_eq!(Message::part("#c", None).to_string(), "PART #c");
        assert_eq!(Message::part("#c", Some("bye")).to_string(), "PART #c :bye");
        assert_eq!(Message::nick("bot").to_string(), "NICK bot");
        assert_eq!(Message::user("bot", "core 2").to_string(), "USER bot * * :core 2");
        assert_eq!(Message::quit("later").to_string(), "QUIT :later");
        assert_eq!(Message::pong("abc").to_string(), "PONG :abc");
    }

    #[test]
    fn test_build_picks_trailing_form() {
        assert_eq!(Message::build("MODE", ["#c", "+o", "n"]).to_string(), "MODE #c +o n");
        assert_eq!(Message::build("TOPIC", ["#c", "new topic"]).to_string(), "TOPIC #c :new topic");
        assert_eq!(Message::build("TOPIC", ["#c", ""]).to_string(), "TOPIC #c :");
        assert_eq!(Message::build("X", [":colon"]).to_string(), "X ::colon");
        assert_eq!(Message::build("LIST", Vec::<String>::new()).to_string(), "LIST");
    }

    #[test]
    fn test_pong_mirrors_ping() {
        let trailing = Message::parse("PING :token").unwrap();
        assert_eq!(Message::pong_for(&trailing).to_string(), "PONG :token");

        let middle = Message::parse("PING irc.example.net").unwrap();
        assert_eq!(Message::pong_for(&middle).to_string(), "PONG irc.example.net");
    }

    #[test]
    fn test_built_message_raw_matches_display() {
        let m = Message::privmsg("#c", "hello");
        assert_eq!(m.raw(), m.to_string());
        assert_eq!(Message::parse(m.raw()).unwrap(), m);
    }
}
