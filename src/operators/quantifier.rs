use crate::timeline::Timeline;
use crate::trace::Trace;
use crate::Formula;

/// Path quantifier requiring its subformula to hold on every path, written `FORALL` or `A`.
///
/// A recorded trace is a single observed path, so the quantifier evaluates exactly like its
/// subformula. Branching traces would need a real semantics here.
#[derive(Debug, Clone)]
pub struct ForAll<F>(F);

impl<F> ForAll<F> {
    pub fn new(subformula: F) -> Self {
        Self(subformula)
    }
}

impl<S, F> Formula<S> for ForAll<F>
where
    F: Formula<S>,
{
    type Metric = F::Metric;
    type Error = F::Error;

    #[inline]
    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.0.evaluate(trace)
    }
}

/// Path quantifier requiring its subformula to hold on some path, written `EXISTS` or `E`.
///
/// On a single observed path this is indistinguishable from [`ForAll`].
#[derive(Debug, Clone)]
pub struct Exists<F>(F);

impl<F> Exists<F> {
    pub fn new(subformula: F) -> Self {
        Self(subformula)
    }
}

impl<S, F> Formula<S> for Exists<F>
where
    F: Formula<S>,
{
    type Metric = F::Metric;
    type Error = F::Error;

    #[inline]
    fn evaluate(&self, trace: &Trace<S>) -> Result<Timeline<Self::Metric>, Self::Error> {
        self.0.evaluate(trace)
    }
}
