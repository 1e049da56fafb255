//! Built-in owner commands.
//!
//! Every command here requires the sender's host to be on the connection's
//! owner allowlist. Hook names share the `builtin*` prefix so the whole set
//! can be dropped with [`HookRegistry::unregister_named`] per command.

use ircore_proto::Message;
use ircore_proto::chan::ChannelExt;

use crate::dispatch::Context;
use crate::error::HandlerError;
use crate::hook::{Field, Hook, HookId, HookRegistry, Predicate, PredicateError};

/// Register the built-in hooks using `prefix` as the command character.
pub fn register_builtin(registry: &HookRegistry, prefix: char) -> Result<Vec<HookId>, PredicateError> {
    let owner_command = |word: &str, hook: Hook| {
        hook.when(Predicate::Owner)
            .when(Predicate::Privmsg)
            .when(Predicate::command(format!("{prefix}{word}")))
    };

    let hooks = vec![
        owner_command(
            "raw",
            Hook::new("builtin*raw", |conn, _, ctx| {
                if ctx.args.is_empty() {
                    return Err(HandlerError::MissingArgument("line"));
                }
                Ok(conn.send(ctx.args)?)
            }),
        ),
        owner_command(
            "join",
            Hook::new("builtin*join", |conn, _, ctx| {
                let mut words = ctx.args.split_whitespace();
                let channels = words.next().ok_or(HandlerError::MissingArgument("channel"))?;
                match words.next() {
                    Some(key) => conn.send_message(&Message::join_with_key(channels, key))?,
                    None => conn.join(channels)?,
                }
                Ok(())
            }),
        ),
        owner_command(
            "part",
            Hook::new("builtin*part", |conn, _, ctx| {
                let (channel, reason) = match ctx.args.split_once(char::is_whitespace) {
                    Some((channel, reason)) => (channel, Some(reason.trim()).filter(|r| !r.is_empty())),
                    None if !ctx.args.is_empty() => (ctx.args, None),
                    None => (ctx.channel.ok_or(HandlerError::MissingArgument("channel"))?, None),
                };
                Ok(conn.part(channel, reason)?)
            }),
        ),
        owner_command(
            "say",
            Hook::new("builtin*say", |conn, _, ctx| {
                let (target, text) = target_and_text(ctx)?;
                Ok(conn.say(target, text)?)
            }),
        ),
        owner_command(
            "me",
            Hook::new("builtin*me", |conn, _, ctx| {
                let (target, text) = target_and_text(ctx)?;
                Ok(conn.me(target, text)?)
            }),
        ),
        owner_command(
            "notice",
            Hook::new("builtin*notice", |conn, _, ctx| {
                let (target, text) = target_and_text(ctx)?;
                Ok(conn.notice(target, text)?)
            }),
        ),
        Hook::new("builtin*hi", |conn, msg, ctx| {
            let addressed = msg.text().split_whitespace().nth(1);
            if addressed != Some(conn.nick().as_str()) {
                return Ok(());
            }
            let target = ctx.channel.ok_or(HandlerError::MissingArgument("channel"))?;
            let nick = msg.source_nick().unwrap_or_default();
            Ok(conn.say(target, &format!("Hello, master {nick}"))?)
        })
        .when(Predicate::Owner)
        .when(Predicate::Privmsg)
        .when(Predicate::regex(Field::Message, r"^hi,\s+\S")?),
    ];

    Ok(hooks.into_iter().map(|hook| registry.register(hook)).collect())
}

/// `[#channel] text`: an explicit channel first, else reply where the
/// command came from.
fn target_and_text<'a>(ctx: &Context<'a>) -> Result<(&'a str, &'a str), HandlerError> {
    let args = ctx.args;
    let (target, text) = if args.is_channel_name() {
        match args.split_once(char::is_whitespace) {
            Some((channel, text)) => (channel, text.trim_start()),
            None => (args, ""),
        }
    } else {
        let channel = ctx.channel.ok_or(HandlerError::MissingArgument("target"))?;
        (channel, args)
    };
    if text.is_empty() {
        return Err(HandlerError::MissingArgument("text"));
    }
    Ok((target, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::tests::detached;
    use crate::connection::{ConnectionSet, ConnectionState};
    use crate::dispatch::Dispatcher;

    const OWNER: &str = ":nova!~nova@user/nova";
    const STRANGER: &str = ":mallory!~m@evil.example";

    fn run(lines: &[String]) -> Vec<String> {
        let registry = HookRegistry::new();
        register_builtin(&registry, '!').unwrap();
        let dispatcher = Dispatcher::new(registry, ConnectionSet::new());
        let (conn, mut rx) = detached(ConnectionState::Registered);
        for line in lines {
            dispatcher.dispatch(&Message::parse(line).unwrap(), &conn);
        }
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(line);
        }
        out
    }

    fn from(prefix: &str, target: &str, text: &str) -> String {
        format!("{prefix} PRIVMSG {target} :{text}")
    }

    #[test]
    fn test_registers_every_builtin() {
        let registry = HookRegistry::new();
        let ids = register_builtin(&registry, '.').unwrap();
        assert_eq!(ids.len(), 7);
        assert_eq!(registry.unregister_named("builtin*say"), 1);
    }

    #[test]
    fn test_say_me_notice() {
        let out = run(&[
            from(OWNER, "#home", "!say hello there"),
            from(OWNER, "#home", "!say #other  over here"),
            from(OWNER, "bot", "!me waves"),
            from(OWNER, "#home", "!notice #other heads up"),
        ]);
        assert_eq!(
            out,
            [
                "PRIVMSG #home :hello there",
                "PRIVMSG #other :over here",
                "PRIVMSG nova :\x01ACTION waves\x01",
                "NOTICE #other :heads up",
            ]
        );
    }

    #[test]
    fn test_raw_join_part() {
        let out = run(&[
            from(OWNER, "#home", "!raw MODE #home +o nova"),
            from(OWNER, "#home", "!join #new"),
            from(OWNER, "#home", "!join #locked secret"),
            from(OWNER, "#home", "!part #new bye all"),
            from(OWNER, "#home", "!part"),
        ]);
        assert_eq!(
            out,
            [
                "MODE #home +o nova",
                "JOIN #new",
                "JOIN #locked secret",
                "PART #new :bye all",
                "PART #home",
            ]
        );
    }

    #[test]
    fn test_non_owner_is_ignored() {
        let out = run(&[
            from(STRANGER, "#home", "!say pwned"),
            from(STRANGER, "#home", "!raw QUIT"),
            format!("{OWNER} NOTICE #home :!say via notice"),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_arguments_send_nothing() {
        let out = run(&[
            from(OWNER, "#home", "!say"),
            from(OWNER, "#home", "!say #other"),
            from(OWNER, "#home", "!raw"),
            from(OWNER, "#home", "!join"),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_hi_greets_only_when_addressed() {
        let out = run(&[
            from(OWNER, "#home", "hi, bot"),
            from(OWNER, "#home", "hi, someoneelse"),
            from(STRANGER, "#home", "hi, bot"),
        ]);
        assert_eq!(out, ["PRIVMSG #home :Hello, master nova"]);
    }
}
