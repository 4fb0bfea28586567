use nom::branch::alt;
use nom::combinator::{cut, map, opt};
use nom::multi::{many0, separated_list0};
use nom::sequence::preceded;

use super::common::{argument, fail, keyword, leftover_kind, space, symbol, word, PResult};
use super::errors::{ParseErrorKind, SyntaxError};
use crate::formula::{Expr, PathQuantifier};
use crate::predicates::{PredicateKind, Proposition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temporal {
    Next,
    Eventually,
    Always,
}

impl Temporal {
    fn apply(self, subformula: Expr) -> Expr {
        match self {
            Self::Next => Expr::next(subformula),
            Self::Eventually => Expr::eventually(subformula),
            Self::Always => Expr::always(subformula),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Not,
    Temporal(Temporal),
    Quantifier(PathQuantifier),
    Combined(PathQuantifier, Temporal),
}

impl Prefix {
    fn lookup(word: &str) -> Option<Self> {
        use PathQuantifier::{Exists, ForAll};
        use Temporal::{Always, Eventually, Next};

        let prefix = match word {
            "X" => Self::Temporal(Next),
            "F" => Self::Temporal(Eventually),
            "G" => Self::Temporal(Always),
            "A" => Self::Quantifier(ForAll),
            "E" => Self::Quantifier(Exists),
            "AX" => Self::Combined(ForAll, Next),
            "AF" => Self::Combined(ForAll, Eventually),
            "AG" => Self::Combined(ForAll, Always),
            "EX" => Self::Combined(Exists, Next),
            "EF" => Self::Combined(Exists, Eventually),
            "EG" => Self::Combined(Exists, Always),
            _ => match word.to_ascii_uppercase().as_str() {
                "NOT" => Self::Not,
                "NEXT" => Self::Temporal(Next),
                "EVENTUALLY" => Self::Temporal(Eventually),
                "ALWAYS" => Self::Temporal(Always),
                "FORALL" => Self::Quantifier(ForAll),
                "EXISTS" => Self::Quantifier(Exists),
                _ => return None,
            },
        };

        Some(prefix)
    }

    fn apply(self, subformula: Expr) -> Expr {
        match self {
            Self::Not => !subformula,
            Self::Temporal(temporal) => temporal.apply(subformula),
            Self::Quantifier(quantifier) => Expr::quantified(quantifier, subformula),
            Self::Combined(quantifier, temporal) => {
                Expr::quantified(quantifier, temporal.apply(subformula))
            }
        }
    }
}

fn prefix_operator(input: &str) -> PResult<'_, Prefix> {
    let (rest, found) = word(input)?;

    match Prefix::lookup(found) {
        Some(prefix) => Ok((rest, prefix)),
        None => Err(nom::Err::Error(SyntaxError::new(input, ParseErrorKind::ExpectedFormula))),
    }
}

/// `!φ`, `NOT φ`, and every temporal or quantifier prefix applied to a unary formula.
fn prefixed(input: &str) -> PResult<'_, Expr> {
    let bang = map(symbol("!"), |_| Prefix::Not);
    let (rest, prefix) = alt((bang, prefix_operator))(input)?;
    let (rest, subformula) = cut(unary)(rest)?;

    Ok((rest, prefix.apply(subformula)))
}

/// Consume a closing parenthesis, classifying whatever stands in its place otherwise.
fn close_paren(input: &str) -> PResult<'_, ()> {
    let (rest, _) = space(input)?;

    match rest.strip_prefix(')') {
        Some(rest) => Ok((rest, ())),
        None => fail(rest, leftover_kind(rest)),
    }
}

/// `UNTIL(φ, ψ)`
fn prefix_until(input: &str) -> PResult<'_, Expr> {
    let (rest, _) = keyword(&["UNTIL"], &[])(input)?;
    let (rest, _) = symbol("(")(rest)?;
    let (rest, left) = cut(formula)(rest)?;

    let (rest, _) = match symbol(",")(rest) {
        Ok(found) => found,
        Err(_) => {
            let (rest, _) = space(rest)?;
            return fail(rest, leftover_kind(rest));
        }
    };

    let (rest, right) = cut(formula)(rest)?;
    let (rest, _) = close_paren(rest)?;

    Ok((rest, Expr::until(left, right)))
}

fn parenthesized(input: &str) -> PResult<'_, Expr> {
    let (rest, _) = symbol("(")(input)?;
    let (rest, subformula) = cut(formula)(rest)?;
    let (rest, _) = close_paren(rest)?;

    Ok((rest, subformula))
}

fn arguments(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, args) = separated_list0(symbol(","), argument)(input)?;
    let (rest, _) = space(rest)?;

    match rest.strip_prefix(')') {
        Some(remaining) => Ok((remaining, args)),
        None if rest.is_empty() => fail(rest, ParseErrorKind::UnbalancedParenthesis),
        None => fail(rest, ParseErrorKind::MalformedArguments),
    }
}

/// `NAME(arg, ...)`
pub(crate) fn atom(input: &str) -> PResult<'_, Expr> {
    let (rest, name) = word(input)?;
    let (rest, _) = symbol("(")(rest)?;
    let (rest, args) = arguments(rest)?;
    let proposition = Proposition::new(PredicateKind::from_name(name), args);

    Ok((rest, Expr::Atom(proposition)))
}

pub(crate) fn unary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = space(input)?;
    let mut parser = alt((prefixed, prefix_until, parenthesized, atom));

    match parser(input) {
        Err(nom::Err::Error(_)) => {
            Err(nom::Err::Error(SyntaxError::new(input, expected_kind(input))))
        }
        result => result,
    }
}

/// A word that is neither a prefix nor a predicate call is an unknown operator.
fn expected_kind(input: &str) -> ParseErrorKind {
    if let Ok((rest, found)) = word(input) {
        let rest = rest.trim_start();

        if !rest.is_empty() && !rest.starts_with('(') {
            return ParseErrorKind::UnknownOperator(found.to_string());
        }
    }

    ParseErrorKind::ExpectedFormula
}

fn until_operator(input: &str) -> PResult<'_, &str> {
    keyword(&["UNTIL"], &["U"])(input)
}

/// `φ UNTIL ψ`, associating to the right.
pub(crate) fn until(input: &str) -> PResult<'_, Expr> {
    let (rest, left) = unary(input)?;

    match opt(until_operator)(rest)? {
        (rest, Some(_)) => {
            let (rest, right) = cut(until)(rest)?;
            Ok((rest, Expr::until(left, right)))
        }
        (rest, None) => Ok((rest, left)),
    }
}

fn and_operator(input: &str) -> PResult<'_, &str> {
    alt((symbol("&&"), symbol("&"), keyword(&["AND"], &[])))(input)
}

pub(crate) fn and(input: &str) -> PResult<'_, Expr> {
    let (rest, first) = until(input)?;
    let (rest, others) = many0(preceded(and_operator, cut(until)))(rest)?;

    Ok((rest, others.into_iter().fold(first, Expr::and)))
}

fn or_operator(input: &str) -> PResult<'_, &str> {
    alt((symbol("||"), symbol("|"), keyword(&["OR"], &[])))(input)
}

pub(crate) fn or(input: &str) -> PResult<'_, Expr> {
    let (rest, first) = and(input)?;
    let (rest, others) = many0(preceded(or_operator, cut(and)))(rest)?;

    Ok((rest, others.into_iter().fold(first, Expr::or)))
}

fn implies_operator(input: &str) -> PResult<'_, &str> {
    alt((symbol("->"), keyword(&["IMPLIES"], &[])))(input)
}

/// `φ IMPLIES ψ`, associating to the right.
pub(crate) fn implies(input: &str) -> PResult<'_, Expr> {
    let (rest, ante) = or(input)?;

    match opt(implies_operator)(rest)? {
        (rest, Some(_)) => {
            let (rest, cons) = cut(implies)(rest)?;
            Ok((rest, Expr::implies(ante, cons)))
        }
        (rest, None) => Ok((rest, ante)),
    }
}

pub(crate) fn formula(input: &str) -> PResult<'_, Expr> {
    implies(input)
}
