//! Construction of symbolic traces from recorded steps.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::config::MonitorConfig;
use crate::error::TraceError;
use crate::predicates::{ContentCount, OverloadPolicy, PredicateLibrary, State};
use crate::snapshot::{EventMetadata, TraceStep};
use crate::trace::Trace;

/// Turns a recorded trajectory into an alternating [`Trace`] of states and action labels.
///
/// Every step contributes one state. The label between states `i` and `i + 1` describes the
/// action of step `i + 1`, since that action produced the later snapshot. Steps are identified by
/// their position in the trajectory in every error.
#[derive(Debug, Clone, Default)]
pub struct TraceBuilder<P = ContentCount> {
    library: PredicateLibrary<P>,
}

impl TraceBuilder<ContentCount> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_library(PredicateLibrary::new(config))
    }
}

impl<P> TraceBuilder<P>
where
    P: OverloadPolicy,
{
    pub fn with_library(library: PredicateLibrary<P>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &PredicateLibrary<P> {
        &self.library
    }

    pub fn build(&self, steps: &[TraceStep]) -> Result<Trace<State>, TraceError> {
        let states = steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.step_state(index, step))
            .collect::<Result<Vec<_>, _>>()?;

        let states = NonEmpty::from_vec(states).ok_or(TraceError::EmptyTrajectory)?;
        let labels = steps.iter().skip(1).map(|step| step.event().label()).collect();
        let trace = Trace::from_parts(states, labels)?;

        tracing::debug!(states = trace.len(), "built trace");
        Ok(trace)
    }

    fn step_state(&self, index: usize, step: &TraceStep) -> Result<State, TraceError> {
        let metadata = step
            .event_metadata
            .as_ref()
            .ok_or(TraceError::MissingMetadata { step: index })?;

        let metadata = EventMetadata::deserialize(metadata)
            .map_err(|source| TraceError::MalformedMetadata { step: index, source })?;

        let objects = metadata
            .snapshots()
            .map_err(|reason| TraceError::InvalidObject { step: index, reason })?;

        Ok(self.library.derive_state(&objects, &metadata.agent(), &step.event()))
    }
}
