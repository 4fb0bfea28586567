#![deny(clippy::all)]

//! Offline safety-rule monitoring for recorded household agent traces.
//!
//! Recorded simulator snapshots are turned into an alternating [`Trace`] of symbolic states and
//! action labels by the [`builder`], using the [`predicates`] and [`geometry`] libraries. Safety
//! rules written in a small temporal logic are parsed into [`formula::Expr`] trees, evaluated over
//! the trace by the [`operators`], and aggregated per rule set by the [`monitor`].

use std::borrow::Borrow;
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

pub mod builder;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod geometry;
pub mod metrics;
#[cfg(feature = "parser")]
pub mod monitor;
pub mod operators;
#[cfg(feature = "parser")]
pub mod parser;
pub mod predicates;
#[cfg(feature = "parser")]
pub mod report;
#[cfg(feature = "parser")]
pub mod rules;
pub mod snapshot;
pub mod timeline;
pub mod trace;

pub use crate::metrics::{Bottom, Join, Meet, Top};
pub use crate::timeline::Timeline;
pub use crate::trace::Trace;

/// Evaluate a trace of states into a timeline of metric values, one per state.
///
/// The value at position `i` is the satisfaction of the formula by the suffix of the trace that
/// starts at state `i`.
pub trait Formula<State> {
    /// The type of value produced for every state
    type Metric;

    /// The type of error that can be generated during evaluation
    type Error;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error>;
}

impl<State, T> Formula<State> for &T
where
    T: Formula<State> + ?Sized,
{
    type Metric = T::Metric;
    type Error = T::Error;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        (**self).evaluate(trace)
    }
}

impl<State, T> Formula<State> for Box<T>
where
    T: Formula<State> + ?Sized,
{
    type Metric = T::Metric;
    type Error = T::Error;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        (**self).evaluate(trace)
    }
}

impl<State, T> Formula<State> for Arc<T>
where
    T: Formula<State> + ?Sized,
{
    type Metric = T::Metric;
    type Error = T::Error;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        (**self).evaluate(trace)
    }
}

impl<State, T> Formula<State> for Rc<T>
where
    T: Formula<State> + ?Sized,
{
    type Metric = T::Metric;
    type Error = T::Error;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        (**self).evaluate(trace)
    }
}

#[derive(Debug, Error)]
enum ErrorKind<Err> {
    #[error("Error evaluating formula: {0}")]
    FormulaError(Err),

    #[error("Formula produced no value for the initial state")]
    EmptyTimelineError,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct EvaluationError<Err>(ErrorKind<Err>);

impl<Err> EvaluationError<Err> {
    fn wrap(err: Err) -> Self {
        Self(ErrorKind::FormulaError(err))
    }

    fn empty() -> Self {
        Self(ErrorKind::EmptyTimelineError)
    }
}

/// Evaluate a formula at the initial state of a trace.
///
/// A safety rule is satisfied by a trace iff this returns `true`.
pub fn evaluate<T, F, State>(trace: T, formula: F) -> Result<F::Metric, EvaluationError<F::Error>>
where
    T: Borrow<Trace<State>>,
    F: Formula<State>,
{
    formula
        .evaluate(trace.borrow())
        .map_err(EvaluationError::wrap)
        .and_then(|timeline| {
            timeline
                .into_iter()
                .next()
                .map(|(_, metric)| metric)
                .ok_or_else(EvaluationError::empty)
        })
}
