use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{alpha1, alphanumeric1, char, multispace0};
use nom::combinator::{map, recognize, verify};
use nom::multi::many0_count;
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;

use super::errors::{ParseErrorKind, SyntaxError};

pub(crate) type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Abort parsing at `input` with the given error.
pub(crate) fn fail<'a, T>(input: &'a str, kind: ParseErrorKind) -> PResult<'a, T> {
    Err(nom::Err::Failure(SyntaxError::new(input, kind)))
}

pub(crate) fn identifier(input: &str) -> PResult<'_, &str> {
    let head = alt((alpha1, tag("_")));
    let tail = many0_count(alt((alphanumeric1, tag("_"))));
    let mut parser = recognize(pair(head, tail));

    parser(input)
}

pub(crate) fn space(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

/// An identifier after optional whitespace.
pub(crate) fn word(input: &str) -> PResult<'_, &str> {
    preceded(multispace0, identifier)(input)
}

/// A keyword that is a whole word. `words` match regardless of case, `symbols` only exactly.
pub(crate) fn keyword<'a>(
    words: &'static [&'static str],
    symbols: &'static [&'static str],
) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    verify(word, move |found: &str| {
        words.iter().any(|w| found.eq_ignore_ascii_case(w)) || symbols.iter().any(|s| *s == found)
    })
}

/// A punctuation token after optional whitespace.
pub(crate) fn symbol<'a>(value: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    preceded(multispace0, tag(value))
}

fn quoted(input: &str) -> PResult<'_, &str> {
    let single = delimited(char('\''), is_not("'"), char('\''));
    let double = delimited(char('"'), is_not("\""), char('"'));
    let mut parser = alt((single, double));

    parser(input)
}

/// A predicate argument: a bare identifier or a quoted string.
pub(crate) fn argument(input: &str) -> PResult<'_, String> {
    let bare = map(identifier, str::to_string);
    let string = map(verify(quoted, |s: &str| !s.trim().is_empty()), |s: &str| {
        s.trim().to_string()
    });
    let mut parser = preceded(multispace0, alt((bare, string)));

    parser(input)
}

/// Classify the input left over where an operator or closing parenthesis was expected.
pub(crate) fn leftover_kind(rest: &str) -> ParseErrorKind {
    if rest.is_empty() || rest.starts_with(')') {
        return ParseErrorKind::UnbalancedParenthesis;
    }

    match identifier(rest) {
        Ok((_, word)) => ParseErrorKind::UnknownOperator(word.to_string()),
        Err(_) => {
            let token = rest.split_whitespace().next().unwrap_or(rest);
            ParseErrorKind::UnexpectedInput(token.to_string())
        }
    }
}
