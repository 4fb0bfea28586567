//! Verdicts for a single rule over a single trace.

use crate::formula::{Expr, FormulaError};
use crate::predicates::State;
use crate::trace::{ActionLabel, Trace};
use crate::{EvaluationError, Formula};

/// Where a trace broke a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Index of the offending state
    pub state: usize,

    /// Index of the offending state in the alternating sequence of states and actions
    pub element: usize,

    /// Label of the action that led into the offending state, absent for the initial state
    pub action: Option<ActionLabel>,
}

impl Violation {
    fn at(trace: &Trace<State>, state: usize) -> Self {
        Self {
            state,
            element: 2 * state,
            action: trace.action_into(state).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Violated(Violation),
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Decide whether a trace satisfies a rule, locating the violation if it does not.
///
/// The reported state depends on the shape of the rule once path quantifiers are removed. For
/// `ALWAYS φ` it is the first state where `φ` fails. For `EVENTUALLY φ` it is the final state,
/// where the obligation was still unmet. Any other rule is reported at the initial state.
pub fn check(expr: &Expr, trace: &Trace<State>) -> Result<Verdict, EvaluationError<FormulaError>> {
    if crate::evaluate(trace, expr)? {
        return Ok(Verdict::Satisfied);
    }

    let state = violation_state(expr, trace).map_err(EvaluationError::wrap)?;
    Ok(Verdict::Violated(Violation::at(trace, state)))
}

fn violation_state(expr: &Expr, trace: &Trace<State>) -> Result<usize, FormulaError> {
    let state = match expr.obligation() {
        Expr::Always(body) => body.evaluate(trace)?.find_position(|holds| !holds).unwrap_or(0),
        Expr::Eventually(_) => trace.last_position(),
        _ => 0,
    };

    Ok(state)
}
