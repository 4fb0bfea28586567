use thiserror::Error;

use crate::metrics::{Join, Meet};
use crate::timeline::Timeline;
use crate::trace::Trace;
use crate::Formula;

/// First-order operator that inverts its subformula, written `NOT` or `!`.
///
/// The `Not` operator evaluates a trace using its subformula, then negates the value at every
/// position of the resulting timeline:
///
/// | position | subformula | not   |
/// | -------- | ---------- | ----- |
/// | 0        | true       | false |
/// | 1        | false      | true  |
///
/// ```rust
/// use hearth::operators::Not;
/// use hearth::predicates::{PredicateKind, Proposition};
///
/// let formula = Not::new(Proposition::unary(PredicateKind::IsOn, "StoveBurner"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Not<F> {
    subformula: F,
}

impl<F> Not<F> {
    pub fn new(subformula: F) -> Self {
        Self { subformula }
    }
}

impl<S, F, M> Formula<S> for Not<F>
where
    F: Formula<S, Metric = M>,
    M: std::ops::Not<Output = M>,
{
    type Metric = M;
    type Error = F::Error;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.subformula
            .evaluate(trace)
            .map(|result| result.into_iter().map_states(|value| !value).collect())
    }
}

/// Error produced during application of a binary operation.
///
/// This error can be produced in the following circumstances:
///
///   1. The two input timelines do not have the same lengths
///   2. When iterating over both timelines, the corresponding positions do not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryEvaluationError {
    #[error("Metric timelines have mismatched lengths: [{0}] [{1}]")]
    MismatchedLengths(usize, usize),

    #[error("Mismatched positions between timelines: [{0}] [{1}]")]
    MismatchedPositions(usize, usize),
}

/// Error produced during the evaluation of a binary operator.
///
/// An error can occur when evaluating a binary operator in the following circumstances:
///
///   1. An error occurs during the evaluation of the left subformula
///   2. An error occurs during the evaluation of the right subformula
///   3. An error occurs while combining the outputs of the sub-formulas, resulting in a
///      [`BinaryEvaluationError`].
#[derive(Debug, Clone, Error)]
pub enum BinaryOperatorError<L, R> {
    /// An error produced by the subformula on the left of the operator
    #[error("Left subformula error: {0}")]
    LeftError(L),

    /// An error produced by the subformula on the right of the operator
    #[error("Right subformula error: {0}")]
    RightError(R),

    #[error("Error evaluating binary operator: {0}")]
    EvaluationError(#[from] BinaryEvaluationError),
}

type BinOpResult<T, E1, E2> = Result<Timeline<T>, BinaryOperatorError<E1, E2>>;

#[derive(Debug, Clone)]
pub(crate) struct Binop<Left, Right> {
    pub(crate) left: Left,
    pub(crate) right: Right,
}

impl<Left, Right> Binop<Left, Right> {
    pub(crate) fn evaluate_left<S, M>(
        &self,
        trace: &Trace<S>,
    ) -> BinOpResult<M, Left::Error, Right::Error>
    where
        Left: Formula<S, Metric = M>,
        Right: Formula<S>,
    {
        self.left.evaluate(trace).map_err(BinaryOperatorError::LeftError)
    }

    pub(crate) fn evaluate_right<S, M>(
        &self,
        trace: &Trace<S>,
    ) -> BinOpResult<M, Left::Error, Right::Error>
    where
        Left: Formula<S>,
        Right: Formula<S, Metric = M>,
    {
        self.right.evaluate(trace).map_err(BinaryOperatorError::RightError)
    }
}

pub(crate) fn binop<I1, I2, F, M>(
    left: I1,
    right: I2,
    f: F,
) -> Result<Timeline<M>, BinaryEvaluationError>
where
    I1: ExactSizeIterator<Item = (usize, M)>,
    I2: ExactSizeIterator<Item = (usize, M)>,
    F: Fn(&M, &M) -> M,
{
    if left.len() != right.len() {
        return Err(BinaryEvaluationError::MismatchedLengths(left.len(), right.len()));
    }

    left.zip(right)
        .map(|((lp, lv), (rp, rv))| {
            if lp == rp {
                Ok((lp, f(&lv, &rv)))
            } else {
                Err(BinaryEvaluationError::MismatchedPositions(lp, rp))
            }
        })
        .collect()
}

/// First-order operator that requires either of its subformulas to hold, written `OR`, `||`, or
/// `|`.
///
/// This operator evaluates a trace using both subformulas and takes the join of the two values at
/// every position.
///
/// | position | left  | right | or    |
/// | -------- | ----- | ----- | ----- |
/// | 0        | true  | false | true  |
/// | 1        | false | false | false |
#[derive(Debug, Clone)]
pub struct Or<Left, Right>(Binop<Left, Right>);

impl<Left, Right> Or<Left, Right> {
    pub fn new(left: Left, right: Right) -> Self {
        Self(Binop { left, right })
    }
}

impl<Left, Right, S, M> Formula<S> for Or<Left, Right>
where
    Left: Formula<S, Metric = M>,
    Right: Formula<S, Metric = M>,
    M: Join,
{
    type Metric = M;
    type Error = BinaryOperatorError<Left::Error, Right::Error>;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let left = self.0.evaluate_left(trace)?;
        let right = self.0.evaluate_right(trace)?;
        let result = binop(left.into_iter(), right.into_iter(), M::max)?;

        Ok(result)
    }
}

/// First-order operator that requires both of its subformulas to hold, written `AND`, `&&`, or
/// `&`.
///
/// This operator evaluates a trace with both subformulas and takes the meet of the two values at
/// every position.
///
/// | position | left  | right | and   |
/// | -------- | ----- | ----- | ----- |
/// | 0        | true  | true  | true  |
/// | 1        | true  | false | false |
#[derive(Debug, Clone)]
pub struct And<Left, Right>(Binop<Left, Right>);

impl<Left, Right> And<Left, Right> {
    pub fn new(left: Left, right: Right) -> Self {
        Self(Binop { left, right })
    }
}

impl<Left, Right, S, M> Formula<S> for And<Left, Right>
where
    Left: Formula<S, Metric = M>,
    Right: Formula<S, Metric = M>,
    M: Meet,
{
    type Metric = M;
    type Error = BinaryOperatorError<Left::Error, Right::Error>;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let left = self.0.evaluate_left(trace)?;
        let right = self.0.evaluate_right(trace)?;
        let result = binop(left.into_iter(), right.into_iter(), M::min)?;

        Ok(result)
    }
}

/// First-order operator that requires the right subformula to hold if the left subformula holds,
/// written `IMPLIES` or `->`.
///
/// The operator is evaluated as `Or(Not(ante), cons)`.
///
/// | position | ante  | cons  | implies |
/// | -------- | ----- | ----- | ------- |
/// | 0        | true  | true  | true    |
/// | 1        | false | false | true    |
/// | 2        | true  | false | false   |
#[derive(Debug, Clone)]
pub struct Implies<Ante, Cons>(Binop<Ante, Cons>);

impl<Ante, Cons> Implies<Ante, Cons> {
    pub fn new(ante: Ante, cons: Cons) -> Self {
        Self(Binop { left: ante, right: cons })
    }
}

impl<Ante, Cons, S, M> Formula<S> for Implies<Ante, Cons>
where
    Ante: Formula<S, Metric = M>,
    Cons: Formula<S, Metric = M>,
    M: std::ops::Not<Output = M> + Join,
{
    type Metric = M;
    type Error = BinaryOperatorError<Ante::Error, Cons::Error>;

    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let ante = self.0.evaluate_left(trace)?.into_iter().map_states(|value| !value);
        let cons = self.0.evaluate_right(trace)?;
        let result = binop(ante, cons.into_iter(), M::max)?;

        Ok(result)
    }
}
