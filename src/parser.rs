//! Parser for safety rule text.
//!
//! Rules are written in a small temporal logic over predicate atoms such as
//! `CLOSE(Book, StoveBurner)`. From loosest to tightest binding, the connectives are
//!
//! | operator     | spellings                     | associativity |
//! | ------------ | ----------------------------- | ------------- |
//! | implication  | `IMPLIES`, `->`               | right         |
//! | disjunction  | `OR`, `\|\|`, `\|`            | left          |
//! | conjunction  | `AND`, `&&`, `&`              | left          |
//! | until        | `UNTIL`, `U`                  | right         |
//! | negation     | `NOT`, `!`                    | prefix        |
//! | temporal     | `NEXT`/`X`, `EVENTUALLY`/`F`, `ALWAYS`/`G` | prefix |
//! | quantifiers  | `FORALL`/`A`, `EXISTS`/`E`    | prefix        |
//!
//! `UNTIL(φ, ψ)` is accepted as well as the infix form, and a path quantifier may be glued to a
//! temporal prefix as in `AG`, `EF` or `AX`. Word operators ignore case. Single-letter operators
//! are uppercase only and are reserved, so they cannot name predicates.
//!
//! ```rust
//! use hearth::formula::Expr;
//! use hearth::parser::parse_formula;
//! use hearth::predicates::PredicateKind;
//!
//! let rule = parse_formula("G(ISON(StoveBurner) -> not(CLOSE(Book, StoveBurner)))").unwrap();
//! let expected = Expr::always(Expr::implies(
//!     Expr::atom(PredicateKind::IsOn, ["StoveBurner"]),
//!     !Expr::atom(PredicateKind::Close, ["Book", "StoveBurner"]),
//! ));
//!
//! assert_eq!(rule, expected);
//! ```

mod common;
mod errors;
mod formula;

use crate::formula::Expr;

pub use errors::{ParseError, ParseErrorKind};

/// Parse a complete rule. Fails if any input other than whitespace is left over.
pub fn parse_formula(input: &str) -> Result<Expr, ParseError> {
    let (rest, expr) = match formula::formula(input) {
        Ok(parsed) => parsed,
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => return Err(err.locate(input)),
        Err(nom::Err::Incomplete(_)) => {
            return Err(ParseError {
                position: input.len(),
                kind: ParseErrorKind::ExpectedFormula,
            })
        }
    };

    let rest = rest.trim_start();

    if rest.is_empty() {
        Ok(expr)
    } else {
        Err(ParseError {
            position: input.len() - rest.len(),
            kind: common::leftover_kind(rest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_formula, ParseError, ParseErrorKind};
    use crate::formula::{Expr, PathQuantifier};
    use crate::predicates::PredicateKind;

    fn error(input: &str) -> ParseError {
        match parse_formula(input) {
            Ok(expr) => panic!("{:?} parsed as {}", input, expr),
            Err(err) => err,
        }
    }

    #[test]
    fn precedence() -> Result<(), ParseError> {
        let a = Expr::atom(PredicateKind::IsOn, ["a"]);
        let b = Expr::atom(PredicateKind::IsOn, ["b"]);
        let c = Expr::atom(PredicateKind::IsOn, ["c"]);

        let parsed = parse_formula("NOT ISON(a) AND ISON(b) OR ISON(c) IMPLIES ISON(a)")?;
        let disjunction = Expr::or(Expr::and(!a.clone(), b.clone()), c.clone());
        let expected = Expr::implies(disjunction, a.clone());
        assert_eq!(parsed, expected);

        let parsed = parse_formula("ISON(a) AND (ISON(b) OR ISON(c))")?;
        assert_eq!(parsed, Expr::and(a.clone(), Expr::or(b.clone(), c)));

        let parsed = parse_formula("ISON(a) AND ISON(b) U ISON(a)")?;
        assert_eq!(parsed, Expr::and(a.clone(), Expr::until(b, a)));

        Ok(())
    }

    #[test]
    fn aliases() -> Result<(), ParseError> {
        let parsed = parse_formula("AG(on(Stove) -> !in(Fork, Microwave))")?;
        let expected = Expr::quantified(
            PathQuantifier::ForAll,
            Expr::always(Expr::implies(
                Expr::atom(PredicateKind::IsOn, ["Stove"]),
                !Expr::atom(PredicateKind::Inside, ["Fork", "Microwave"]),
            )),
        );

        assert_eq!(parsed, expected);
        Ok(())
    }

    #[test]
    fn display_parses_back() -> Result<(), ParseError> {
        let rules = [
            "G(ISON(StoveBurner) -> not(CLOSE(Book, StoveBurner)))",
            "EF(HELD('Apple|1') U ISOPEN(Fridge))",
            "X X NOT OVERLOAD(Shelf) || COLLISION(Agent)",
        ];

        for rule in rules {
            let parsed = parse_formula(rule)?;
            assert_eq!(parse_formula(&parsed.to_string())?, parsed);
        }

        Ok(())
    }

    #[test]
    fn unbalanced_parenthesis() {
        assert_eq!(
            error("G(ISON(a)"),
            ParseError {
                position: 9,
                kind: ParseErrorKind::UnbalancedParenthesis
            }
        );
        assert_eq!(error("ISON(a))").kind, ParseErrorKind::UnbalancedParenthesis);
        assert_eq!(error("ISON(a").kind, ParseErrorKind::UnbalancedParenthesis);
    }

    #[test]
    fn unknown_operator() {
        assert_eq!(
            error("ISON(a) XOR ISON(b)"),
            ParseError {
                position: 8,
                kind: ParseErrorKind::UnknownOperator("XOR".to_string())
            }
        );
        assert_eq!(
            error("G(ISON(a) NAND ISON(b))").kind,
            ParseErrorKind::UnknownOperator("NAND".to_string())
        );
        assert_eq!(
            error("FOO ISON(a)"),
            ParseError {
                position: 0,
                kind: ParseErrorKind::UnknownOperator("FOO".to_string())
            }
        );
        assert_eq!(
            error("G(BAR ISON(a))"),
            ParseError {
                position: 2,
                kind: ParseErrorKind::UnknownOperator("BAR".to_string())
            }
        );
    }

    #[test]
    fn malformed_arguments() {
        assert_eq!(
            error("CLOSE(Book StoveBurner)"),
            ParseError {
                position: 11,
                kind: ParseErrorKind::MalformedArguments
            }
        );
        assert_eq!(error("CLOSE(Book,)").kind, ParseErrorKind::MalformedArguments);
    }

    #[test]
    fn expected_formula() {
        assert_eq!(
            error(""),
            ParseError {
                position: 0,
                kind: ParseErrorKind::ExpectedFormula
            }
        );
        assert_eq!(
            error("ISON(a) AND"),
            ParseError {
                position: 11,
                kind: ParseErrorKind::ExpectedFormula
            }
        );
        assert_eq!(error("G()").kind, ParseErrorKind::ExpectedFormula);
    }

    #[test]
    fn unexpected_input() {
        assert_eq!(
            error("ISON(a) $ ISON(b)"),
            ParseError {
                position: 8,
                kind: ParseErrorKind::UnexpectedInput("$".to_string())
            }
        );
    }
}
