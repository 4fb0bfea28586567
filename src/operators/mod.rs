//! Combinatorial operators for constructing formulas.
//!
//! Operators do not inspect states themselves. They delegate evaluation to their operands and
//! combine the [`Timeline`](crate::Timeline)s those produce, so every formula bottoms out in an
//! expression that does look at states, such as a
//! [`Proposition`](crate::predicates::Proposition).
//!
//! # First Order Operators
//!
//!   - [`Not`]
//!   - [`And`]
//!   - [`Or`]
//!   - [`Implies`]
//!
//! Each of these operators only depends on the current state.
//!
//! # Temporal Operators
//!
//! Temporal operators look at the current state and the states after it. For a trace
//!
//! ```text
//! S0 S1 S2 S3 S4
//! ```
//!
//! an operator evaluated at `S1` considers the interval
//!
//! ```text
//! S0 S1 S2 S3 S4
//!    |--------|
//! ```
//!
//! [`Next`] requires its subformula to hold at the **next** state, [`Always`] at every remaining
//! state, and [`Eventually`] at some remaining state. [`Until`] is a _binary_ operator requiring
//! its second subformula to hold at some remaining state and its first to hold at every state
//! before that one.
//!
//! # Path Quantifiers
//!
//! [`ForAll`] and [`Exists`] annotate a subformula with a path quantifier. Traces are single
//! observed paths, so both evaluate as their subformula.
//!
//! # Examples
//!
//! ```rust
//! use hearth::{evaluate, Trace};
//! use hearth::operators::{Always, Implies, Not};
//! use hearth::predicates::{PredicateKind, Proposition, State};
//!
//! let stove_on = Proposition::unary(PredicateKind::IsOn, "StoveBurner");
//! let book_close = Proposition::binary(PredicateKind::Close, "Book", "StoveBurner");
//! let rule = Always::new(Implies::new(stove_on.clone(), Not::new(book_close)));
//!
//! let trace = Trace::new(State::from_iter([stove_on]));
//! assert!(evaluate(&trace, &rule).unwrap());
//! ```

mod first_order;
mod forward;
mod quantifier;

pub use first_order::{And, BinaryEvaluationError, BinaryOperatorError, Implies, Not, Or};
pub use forward::{Always, Eventually, Next, Until};
pub use quantifier::{Exists, ForAll};

#[cfg(test)]
mod test {
    use nonempty::NonEmpty;
    use thiserror::Error;

    use crate::timeline::Timeline;
    use crate::trace::{ActionLabel, Trace};
    use crate::Formula;

    /// Build a trace whose states are the given values, joined by placeholder labels.
    pub fn states<S, const N: usize>(values: [S; N]) -> Trace<S> {
        let states = NonEmpty::from_vec(Vec::from(values)).expect("at least one state");
        let actions = (1..states.len()).map(|i| ActionLabel::from(format!("step {}", i))).collect();

        Trace::from_parts(states, actions).expect("one label per transition")
    }

    pub struct Const;

    #[derive(Debug, Error)]
    pub enum ConstError {}

    impl<S> Formula<S> for Const
    where
        S: Clone,
    {
        type Metric = S;
        type Error = ConstError;

        fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
            Ok(trace.states().cloned().enumerate().collect())
        }
    }

    pub struct ConstLeft;

    impl<L, R> Formula<(L, R)> for ConstLeft
    where
        L: Clone,
    {
        type Metric = L;
        type Error = ConstError;

        fn evaluate(&self, trace: &Trace<(L, R)>) -> Result<Timeline<Self::Metric>, Self::Error> {
            let left = trace
                .states()
                .enumerate()
                .map(|(position, (left, _))| (position, left.clone()))
                .collect();

            Ok(left)
        }
    }

    pub struct ConstRight;

    impl<L, R> Formula<(L, R)> for ConstRight
    where
        R: Clone,
    {
        type Metric = R;
        type Error = ConstError;

        fn evaluate(&self, trace: &Trace<(L, R)>) -> Result<Timeline<Self::Metric>, Self::Error> {
            let right = trace
                .states()
                .enumerate()
                .map(|(position, (_, right))| (position, right.clone()))
                .collect();

            Ok(right)
        }
    }
}
