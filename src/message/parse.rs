//! Nom-based staged line parser.
//!
//! A line is decomposed by sequential, non-backtracking stages. Each stage
//! consumes a prefix of the remaining text and hands the rest to the next:
//!
//! ```text
//! [@tags ][:origin ]<command>[ params][ :trailing]
//! ```
//!
//! Only the command stage can fail the parse. Anything the trailing stage
//! does not consume is returned as the remainder and reported by the caller.

use nom::{
    branch::alt,
    bytes::complete::{take_till, take_until},
    character::complete::char,
    combinator::{opt, rest},
    error::{context, VerboseError},
    sequence::{preceded, terminated},
    IResult,
};

type StageResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Borrowed output of the parser stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawStages<'a> {
    pub tags: Option<&'a str>,
    pub origin: Option<&'a str>,
    pub command: &'a str,
    pub params: Option<&'a str>,
    pub trailing: Option<&'a str>,
}

/// Stage 1: `@tag-block` up to the first space.
fn tag_block(input: &str) -> StageResult<'_, Option<&str>> {
    context(
        "tag block",
        opt(terminated(
            preceded(char('@'), take_till(|c| c == ' ')),
            opt(char(' ')),
        )),
    )(input)
}

/// Stage 2: `:origin` up to the next space.
fn origin(input: &str) -> StageResult<'_, Option<&str>> {
    context(
        "origin",
        opt(terminated(
            preceded(char(':'), take_till(|c| c == ' ')),
            opt(char(' ')),
        )),
    )(input)
}

/// Stage 3: command verb up to the next space. May be empty.
fn command(input: &str) -> StageResult<'_, &str> {
    context(
        "command",
        terminated(take_till(|c| c == ' '), opt(char(' '))),
    )(input)
}

/// Stage 4: raw middle parameters, up to ` :` or end of line.
fn params(input: &str) -> StageResult<'_, Option<&str>> {
    if input.starts_with(':') {
        return Ok((input, None));
    }
    let (input, raw) = context("params", alt((take_until(" :"), rest)))(input)?;
    Ok((input, Some(raw).filter(|p| !p.is_empty())))
}

/// Stage 5: trailing payload after the ` :` marker, up to a stray CR or LF.
fn trailing(input: &str) -> StageResult<'_, Option<&str>> {
    let body = input.strip_prefix(' ').unwrap_or(input);
    if body.is_empty() {
        return Ok((body, None));
    }
    let body = body.strip_prefix(':').unwrap_or(body);
    let end = body.find(['\r', '\n']).unwrap_or(body.len());
    Ok((&body[end..], Some(body[..end].trim())))
}

/// Run every stage over a terminator-stripped line.
///
/// Returns the text left unconsumed by the final stage together with the
/// extracted fields. An empty command is returned as-is; the caller decides
/// whether that is fatal.
pub(crate) fn parse_stages(line: &str) -> StageResult<'_, RawStages<'_>> {
    let (input, tags) = tag_block(line)?;
    let (input, origin) = origin(input)?;
    let (input, command) = command(input)?;
    if command.is_empty() {
        return Ok((
            input,
            RawStages {
                tags,
                origin,
                command,
                params: None,
                trailing: None,
            },
        ));
    }
    let (input, params) = params(input)?;
    let (input, trailing) = trailing(input)?;
    Ok((
        input,
        RawStages {
            tags,
            origin,
            command,
            params,
            trailing,
        },
    ))
}

/// Find the first `#`-prefixed token in a params string, sigil stripped.
pub(crate) fn channel_param(params: &str) -> Option<&str> {
    params
        .split(' ')
        .filter_map(|token| token.strip_prefix('#'))
        .find(|name| !name.is_empty())
}
