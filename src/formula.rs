//! Formula trees produced by the rule parser.
//!
//! An [`Expr`] is built once from rule text and can be evaluated against any number of traces. It
//! evaluates by delegating each node to the matching operator in [`operators`](crate::operators).

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::operators::{
    Always, And, BinaryEvaluationError, BinaryOperatorError, Eventually, Exists, ForAll, Implies,
    Next, Not, Or, Until,
};
use crate::predicates::{PredicateKind, Proposition, State};
use crate::timeline::Timeline;
use crate::trace::Trace;
use crate::Formula;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathQuantifier {
    ForAll,
    Exists,
}

impl Display for PathQuantifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForAll => f.write_str("FORALL"),
            Self::Exists => f.write_str("EXISTS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Atom(Proposition),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Next(Box<Expr>),
    Eventually(Box<Expr>),
    Always(Box<Expr>),
    Until(Box<Expr>, Box<Expr>),
    Quantified(PathQuantifier, Box<Expr>),
}

impl Expr {
    pub fn atom<I, S>(kind: PredicateKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Atom(Proposition::new(kind, args))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn implies(ante: Expr, cons: Expr) -> Self {
        Self::Implies(Box::new(ante), Box::new(cons))
    }

    pub fn next(subformula: Expr) -> Self {
        Self::Next(Box::new(subformula))
    }

    pub fn eventually(subformula: Expr) -> Self {
        Self::Eventually(Box::new(subformula))
    }

    pub fn always(subformula: Expr) -> Self {
        Self::Always(Box::new(subformula))
    }

    pub fn until(left: Expr, right: Expr) -> Self {
        Self::Until(Box::new(left), Box::new(right))
    }

    pub fn quantified(quantifier: PathQuantifier, subformula: Expr) -> Self {
        Self::Quantified(quantifier, Box::new(subformula))
    }

    /// The formula with any leading path quantifiers removed.
    pub fn obligation(&self) -> &Expr {
        match self {
            Self::Quantified(_, subformula) => subformula.obligation(),
            other => other,
        }
    }

    /// Replace every atom argument that names a placeholder with its bound value.
    pub fn ground(&self, substitutions: &BTreeMap<String, String>) -> Expr {
        let ground = |subformula: &Expr| Box::new(subformula.ground(substitutions));

        match self {
            Self::Atom(proposition) => {
                let args = proposition
                    .args
                    .iter()
                    .map(|arg| substitutions.get(arg).unwrap_or(arg).clone());

                Self::Atom(Proposition::new(proposition.kind.clone(), args))
            }
            Self::Not(subformula) => Self::Not(ground(subformula)),
            Self::And(left, right) => Self::And(ground(left), ground(right)),
            Self::Or(left, right) => Self::Or(ground(left), ground(right)),
            Self::Implies(ante, cons) => Self::Implies(ground(ante), ground(cons)),
            Self::Next(subformula) => Self::Next(ground(subformula)),
            Self::Eventually(subformula) => Self::Eventually(ground(subformula)),
            Self::Always(subformula) => Self::Always(ground(subformula)),
            Self::Until(left, right) => Self::Until(ground(left), ground(right)),
            Self::Quantified(quantifier, subformula) => {
                Self::Quantified(*quantifier, ground(subformula))
            }
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl From<Proposition> for Expr {
    fn from(proposition: Proposition) -> Self {
        Self::Atom(proposition)
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();

    chars.next().map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders the formula as rule text that parses back into the same tree. Binary operators are
/// always parenthesized.
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atom(proposition) => {
                write!(f, "{}(", proposition.kind)?;

                for (index, arg) in proposition.args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }

                    if is_identifier(arg) {
                        write!(f, "{}", arg)?;
                    } else {
                        write!(f, "'{}'", arg)?;
                    }
                }

                write!(f, ")")
            }
            Self::Not(subformula) => write!(f, "NOT {}", subformula),
            Self::And(left, right) => write!(f, "({} AND {})", left, right),
            Self::Or(left, right) => write!(f, "({} OR {})", left, right),
            Self::Implies(ante, cons) => write!(f, "({} IMPLIES {})", ante, cons),
            Self::Next(subformula) => write!(f, "NEXT {}", subformula),
            Self::Eventually(subformula) => write!(f, "EVENTUALLY {}", subformula),
            Self::Always(subformula) => write!(f, "ALWAYS {}", subformula),
            Self::Until(left, right) => write!(f, "({} UNTIL {})", left, right),
            Self::Quantified(quantifier, subformula) => write!(f, "{} {}", quantifier, subformula),
        }
    }
}

#[cfg(feature = "parser")]
impl std::str::FromStr for Expr {
    type Err = crate::parser::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_formula(s)
    }
}

/// Error produced while combining the timelines of two subformulas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(transparent)]
pub struct FormulaError(#[from] BinaryEvaluationError);

impl From<BinaryOperatorError<FormulaError, FormulaError>> for FormulaError {
    fn from(err: BinaryOperatorError<FormulaError, FormulaError>) -> Self {
        match err {
            BinaryOperatorError::LeftError(inner) | BinaryOperatorError::RightError(inner) => inner,
            BinaryOperatorError::EvaluationError(inner) => Self(inner),
        }
    }
}

impl From<Infallible> for FormulaError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

impl Formula<State> for Expr {
    type Metric = bool;
    type Error = FormulaError;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let timeline = match self {
            Self::Atom(proposition) => proposition.evaluate(trace)?,
            Self::Not(subformula) => Not::new(subformula.as_ref()).evaluate(trace)?,
            Self::And(left, right) => And::new(left.as_ref(), right.as_ref()).evaluate(trace)?,
            Self::Or(left, right) => Or::new(left.as_ref(), right.as_ref()).evaluate(trace)?,
            Self::Implies(ante, cons) => {
                Implies::new(ante.as_ref(), cons.as_ref()).evaluate(trace)?
            }
            Self::Next(subformula) => Next::new(subformula.as_ref()).evaluate(trace)?,
            Self::Eventually(subformula) => Eventually::new(subformula.as_ref()).evaluate(trace)?,
            Self::Always(subformula) => Always::new(subformula.as_ref()).evaluate(trace)?,
            Self::Until(left, right) => Until::new(left.as_ref(), right.as_ref()).evaluate(trace)?,
            Self::Quantified(PathQuantifier::ForAll, subformula) => {
                ForAll::new(subformula.as_ref()).evaluate(trace)?
            }
            Self::Quantified(PathQuantifier::Exists, subformula) => {
                Exists::new(subformula.as_ref()).evaluate(trace)?
            }
        };

        Ok(timeline)
    }
}
