use nom::error::{ErrorKind, ParseError as NomParseError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("unknown operator \"{0}\"")]
    UnknownOperator(String),

    #[error("malformed predicate arguments")]
    MalformedArguments,

    #[error("expected a formula")]
    ExpectedFormula,

    #[error("unexpected input \"{0}\"")]
    UnexpectedInput(String),
}

/// Error produced when rule text cannot be parsed into a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {position}")]
pub struct ParseError {
    /// Byte offset of the offending token in the rule text
    pub position: usize,
    pub kind: ParseErrorKind,
}

/// Error threaded through the nom parsers. Remembers the remaining input at the point of failure
/// so the offset can be recovered once parsing stops.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError<'a> {
    pub(crate) input: &'a str,
    pub(crate) kind: ParseErrorKind,
}

impl<'a> SyntaxError<'a> {
    pub(crate) fn new(input: &'a str, kind: ParseErrorKind) -> Self {
        Self { input, kind }
    }

    pub(crate) fn locate(self, source: &str) -> ParseError {
        ParseError {
            position: source.len() - self.input.len(),
            kind: self.kind,
        }
    }
}

impl<'a> NomParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _: ErrorKind) -> Self {
        Self::new(input, ParseErrorKind::ExpectedFormula)
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }

    /// Keep whichever alternative got further into the input.
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}
