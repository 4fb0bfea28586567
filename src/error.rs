//! Structural errors raised while ingesting configuration, trace and rule-set files.

use std::io;

use thiserror::Error;

use crate::trace::TraceShapeError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A trace that cannot be evaluated. Every rule checked against it is reported as unevaluable.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Could not read trace: {0}")]
    Io(#[from] io::Error),

    #[error("Trace is not a valid trace record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Trace contains no steps")]
    EmptyTrajectory,

    #[error("Step {step} has no event_metadata")]
    MissingMetadata { step: usize },

    #[error("Step {step} has malformed event_metadata: {source}")]
    MalformedMetadata { step: usize, source: serde_json::Error },

    #[error("Step {step} has an invalid object: {reason}")]
    InvalidObject { step: usize, reason: String },

    #[error(transparent)]
    Shape(#[from] TraceShapeError),
}

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("Could not read rule set: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON rule set: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML rule set: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Rule set contains no rules")]
    Empty,
}
