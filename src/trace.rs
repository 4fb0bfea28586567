//! The alternating sequence of states and action labels observed during one run.
//!
//! A [`Trace`] always starts and ends on a state. Between every pair of consecutive states sits
//! exactly one [`ActionLabel`] describing the transition, so a trace with `n` states holds `n - 1`
//! labels and `2n - 1` elements in total. States are stored in a [`NonEmpty`] vector, which makes
//! the empty trace unrepresentable.
//!
//! ```rust
//! use hearth::trace::{ActionLabel, Trace};
//!
//! let mut trace = Trace::new("closed");
//! trace.push(ActionLabel::from("action: 'OpenObject' 'Fridge|1'"), "open");
//!
//! assert_eq!(trace.len(), 2);
//! assert_eq!(trace.element_count(), 3);
//! ```

use std::fmt::{Display, Formatter};

use either::Either;
use nonempty::NonEmpty;
use serde::Serialize;
use thiserror::Error;

/// A human-readable description of the action executed between two states.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ActionLabel(String);

impl ActionLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ActionLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ActionLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ActionLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single element of the alternating sequence.
pub type Element<'a, S> = Either<&'a S, &'a ActionLabel>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("A trace with {states} states requires {expected} action labels, found {actions}")]
pub struct TraceShapeError {
    states: usize,
    expected: usize,
    actions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace<S> {
    states: NonEmpty<S>,
    actions: Vec<ActionLabel>,
}

impl<S> Trace<S> {
    /// Create a trace containing only an initial state.
    pub fn new(initial: S) -> Self {
        Self {
            states: NonEmpty::new(initial),
            actions: Vec::new(),
        }
    }

    /// Assemble a trace from its states and labels, checking the alternation invariant.
    pub fn from_parts(
        states: NonEmpty<S>,
        actions: Vec<ActionLabel>,
    ) -> Result<Self, TraceShapeError> {
        let expected = states.len() - 1;

        if actions.len() != expected {
            return Err(TraceShapeError {
                states: states.len(),
                expected,
                actions: actions.len(),
            });
        }

        Ok(Self { states, actions })
    }

    /// Extend the trace with a transition and the state it produced.
    pub fn push(&mut self, action: ActionLabel, state: S) {
        self.actions.push(action);
        self.states.push(state);
    }

    /// Number of states in the trace.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// A trace always holds at least its initial state.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of elements in the alternating sequence, which is always odd.
    pub fn element_count(&self) -> usize {
        self.states.len() + self.actions.len()
    }

    /// Index of the final state.
    pub fn last_position(&self) -> usize {
        self.states.len() - 1
    }

    pub fn initial(&self) -> &S {
        self.states.first()
    }

    pub fn state(&self, position: usize) -> Option<&S> {
        self.states.get(position)
    }

    /// The label of the transition from state `position` to state `position + 1`.
    pub fn action(&self, position: usize) -> Option<&ActionLabel> {
        self.actions.get(position)
    }

    /// The label of the transition that produced state `position`, if it is not the initial one.
    pub fn action_into(&self, position: usize) -> Option<&ActionLabel> {
        position.checked_sub(1).and_then(|previous| self.actions.get(previous))
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.states.iter()
    }

    /// Iterate over the alternating sequence `State, Action, State, ..., State`.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_, S>> {
        let labels = self.actions.iter().map(Some).chain(std::iter::once(None));

        self.states.iter().zip(labels).flat_map(|(state, label)| {
            std::iter::once(Either::Left(state)).chain(label.map(Either::Right))
        })
    }
}

impl<S> Display for Trace<S>
where
    S: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut position = 0;

        for element in self.elements() {
            match element {
                Either::Left(state) => {
                    writeln!(f, "[{}] {}", position, state)?;
                    position += 1;
                }
                Either::Right(action) => writeln!(f, "    {}", action)?,
            }
        }

        Ok(())
    }
}
