use crate::metrics::{Bottom, Join, Meet, Top};
use crate::timeline::{Range, Timeline};
use crate::trace::Trace;
use crate::Formula;

use super::{BinaryEvaluationError, BinaryOperatorError};

/// Folds a timeline from its last position back to its first, yielding the running combination
/// at every position.
struct ForwardIter<'a, T, F> {
    rest: Range<'a, T>,
    state: Option<(usize, T)>,
    combine: F,
}

impl<'a, T, F> ForwardIter<'a, T, F>
where
    F: Fn(&T, &T) -> T,
{
    fn new(mut range: Range<'a, T>, init: T, combine: F) -> Self {
        // An empty range still yields the initial value at position 0, which is what a forward
        // operator reports for an empty timeline.
        let state = match range.next_back() {
            Some((position, value)) => Some((position, combine(&init, value))),
            None => Some((0, init)),
        };

        Self {
            rest: range,
            state,
            combine,
        }
    }
}

impl<'a, T, F> Iterator for ForwardIter<'a, T, F>
where
    F: Fn(&T, &T) -> T,
{
    type Item = (usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state.take()?;
        self.state = self
            .rest
            .next_back()
            .map(|(position, value)| (position, (self.combine)(&state.1, value)));

        Some(state)
    }
}

#[derive(Debug, Clone)]
struct UnaryOperator<F> {
    subformula: F,
}

impl<F> UnaryOperator<F> {
    fn evaluate<S, I, C, M>(
        &self,
        trace: &Trace<S>,
        init: I,
        combine: C,
    ) -> Result<Timeline<M>, F::Error>
    where
        F: Formula<S, Metric = M>,
        I: Fn() -> M,
        C: Fn(&M, &M) -> M,
    {
        let inner = self.subformula.evaluate(trace)?;
        let result = ForwardIter::new(inner.range(..), init(), combine).collect();

        Ok(result)
    }
}

/// Temporal operator that requires its subformula to hold at every later state, written `ALWAYS`
/// or `G`.
///
/// The `Always` operator scans backwards from the end of the trace and takes the meet of every
/// value it has seen, so the value at a position is `true` only if the subformula holds there and
/// at every following position:
///
/// | position | subformula | always |
/// | -------- | ---------- | ------ |
/// | 0        | true       | false  |
/// | 1        | false      | false  |
/// | 2        | true       | true   |
/// | 3        | true       | true   |
///
/// ```rust
/// use hearth::operators::{Always, Not};
/// use hearth::predicates::{PredicateKind, Proposition};
///
/// let overloaded = Proposition::unary(PredicateKind::Overload, "Shelf");
/// let never_overloaded = Always::new(Not::new(overloaded));
/// ```
#[derive(Debug, Clone)]
pub struct Always<F>(UnaryOperator<F>);

impl<F> Always<F> {
    pub fn new(subformula: F) -> Self {
        Self(UnaryOperator { subformula })
    }
}

impl<S, F, M> Formula<S> for Always<F>
where
    F: Formula<S, Metric = M>,
    M: Top + Meet,
{
    type Metric = M;
    type Error = F::Error;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.0.evaluate(trace, M::top, M::min)
    }
}

/// Temporal operator that requires its subformula to hold at the current or some later state,
/// written `EVENTUALLY` or `F`.
///
/// The `Eventually` operator scans backwards from the end of the trace and takes the join of
/// every value it has seen:
///
/// | position | subformula | eventually |
/// | -------- | ---------- | ---------- |
/// | 0        | false      | true       |
/// | 1        | true       | true       |
/// | 2        | false      | false      |
#[derive(Debug, Clone)]
pub struct Eventually<F>(UnaryOperator<F>);

impl<F> Eventually<F> {
    pub fn new(subformula: F) -> Self {
        Self(UnaryOperator { subformula })
    }
}

impl<S, F, M> Formula<S> for Eventually<F>
where
    F: Formula<S, Metric = M>,
    M: Bottom + Join,
{
    type Metric = M;
    type Error = F::Error;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.0.evaluate(trace, M::bottom, M::max)
    }
}

/// Temporal operator that requires its subformula to hold at the next state, written `NEXT` or
/// `X`.
///
/// This operator shifts every value of its subformula one position to the left. The final state
/// has no successor, so its value is replaced with the bottom of the lattice:
///
/// | position | subformula | next  |
/// | -------- | ---------- | ----- |
/// | 0        | false      | true  |
/// | 1        | true       | true  |
/// | 2        | true       | false |
#[derive(Clone, Debug)]
pub struct Next<F> {
    subformula: F,
}

impl<F> Next<F> {
    pub fn new(subformula: F) -> Self {
        Self { subformula }
    }
}

fn next_op<T>(timeline: Timeline<T>) -> Timeline<T>
where
    T: Bottom,
{
    let mut iter = timeline.into_iter().rev();
    let mut shifted = Timeline::default();

    if let Some((position, mut value)) = iter.next() {
        shifted.insert(position, T::bottom());

        for (prev_position, prev_value) in iter {
            shifted.insert(prev_position, value);
            value = prev_value;
        }
    }

    shifted
}

impl<S, F, M> Formula<S> for Next<F>
where
    F: Formula<S, Metric = M>,
    M: Bottom,
{
    type Metric = M;
    type Error = F::Error;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.subformula.evaluate(trace).map(next_op)
    }
}

/// Temporal operator that requires its right subformula to hold at some current or later state
/// and its left subformula to hold at every state before that, written `UNTIL` or `U`.
///
/// The operator is computed backwards from the end of the trace using the expansion
/// `left U right = right or (left and next(left U right))`, where the value past the final state
/// is the bottom of the lattice.
///
/// | position | left  | right | until |
/// | -------- | ----- | ----- | ----- |
/// | 0        | true  | false | true  |
/// | 1        | true  | false | true  |
/// | 2        | false | true  | true  |
/// | 3        | true  | false | false |
#[derive(Clone, Debug)]
pub struct Until<Left, Right> {
    left: Left,
    right: Right,
}

impl<Left, Right> Until<Left, Right> {
    pub fn new(left: Left, right: Right) -> Self {
        Self { left, right }
    }
}

fn until_op<M>(left: Timeline<M>, right: Timeline<M>) -> Result<Timeline<M>, BinaryEvaluationError>
where
    M: Clone + Bottom + Meet + Join,
{
    if left.len() != right.len() {
        return Err(BinaryEvaluationError::MismatchedLengths(left.len(), right.len()));
    }

    let mut timeline = Timeline::default();
    let mut following = M::bottom();

    for ((lp, lv), (rp, rv)) in left.into_iter().rev().zip(right.into_iter().rev()) {
        if lp != rp {
            return Err(BinaryEvaluationError::MismatchedPositions(lp, rp));
        }

        following = rv.max(&lv.min(&following));
        timeline.insert(lp, following.clone());
    }

    Ok(timeline)
}

impl<Left, Right, S, M> Formula<S> for Until<Left, Right>
where
    Left: Formula<S, Metric = M>,
    Right: Formula<S, Metric = M>,
    M: Clone + Bottom + Meet + Join,
{
    type Metric = M;
    type Error = BinaryOperatorError<Left::Error, Right::Error>;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let left = self.left.evaluate(trace).map_err(BinaryOperatorError::LeftError)?;
        let right = self.right.evaluate(trace).map_err(BinaryOperatorError::RightError)?;
        let result = until_op(left, right)?;

        Ok(result)
    }
}
