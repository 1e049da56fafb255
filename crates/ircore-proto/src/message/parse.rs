//! Nom-based line parser.
//!
//! Produces borrowed slices into the input; [`super::Message::parse`] turns
//! them into an owned value.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::char,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::MessageParseError;

/// Parse IRCv3 message tags (the part after `@` and before the first space).
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command token. Anything up to the next space is accepted.
fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ' ')(input)
}

fn skip_spaces(input: &str) -> &str {
    input.trim_start_matches(' ')
}

/// Split the parameter section. Runs of spaces separate parameters; a token
/// starting with `:` swallows the rest of the line.
///
/// Returns the parameters and whether the last one was written in trailing
/// form.
fn parse_params(input: &str) -> (SmallVec<[&str; 15]>, bool) {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = skip_spaces(rest);
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            return (params, true);
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    (params, false)
}

/// Remove exactly one line terminator (`\r\n` or `\n`), tolerating a lone `\r`.
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// A parsed line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedMessage<'a> {
    /// Raw tags string (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw prefix string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command token.
    pub command: &'a str,
    /// Parameters, trailing included and stripped of its `:`.
    pub params: SmallVec<[&'a str; 15]>,
    /// Whether the last parameter used the `:` form.
    pub trailing: bool,
}

impl<'a> ParsedMessage<'a> {
    /// Parse one line. The terminator must already be stripped.
    ///
    /// IRC message format:
    /// ```text
    /// [@tags] [:prefix] <command> [params...] [:trailing]
    /// ```
    pub fn parse(line: &'a str) -> Result<Self, MessageParseError> {
        if line.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }
        let mut rest = skip_spaces(line);

        let mut tags = None;
        if rest.starts_with('@') {
            let (r, t) = parse_tags(rest).map_err(|_| MessageParseError::UnterminatedTags)?;
            tags = Some(t);
            rest = skip_spaces(r);
        }

        let mut prefix = None;
        if rest.starts_with(':') {
            let (r, p) = parse_prefix(rest)
                .map_err(|_| MessageParseError::InvalidPrefix(rest.to_owned()))?;
            prefix = Some(p);
            rest = skip_spaces(r);
        }

        let (rest, command) =
            parse_command(rest).map_err(|_| MessageParseError::MissingCommand)?;
        let (params, trailing) = parse_params(rest);

        Ok(Self {
            tags,
            prefix,
            command,
            params,
            trailing,
        })
    }
}
