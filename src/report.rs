//! Serializable evaluation results.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::evaluator::Verdict;
use crate::rules::{Binding, GroundRule, RejectedRule};
use crate::trace::ActionLabel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Satisfied,
    Violated {
        state: usize,
        element: usize,
        action: Option<ActionLabel>,
    },
    Unevaluable {
        reason: String,
    },
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Satisfied => Self::Satisfied,
            Verdict::Violated(violation) => Self::Violated {
                state: violation.state,
                element: violation.element,
                action: violation.action,
            },
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfied => write!(f, "satisfied"),
            Self::Violated {
                state,
                action: Some(action),
                ..
            } => write!(f, "violated at state {} after {}", state, action),
            Self::Violated { state, .. } => write!(f, "violated at state {}", state),
            Self::Unevaluable { reason } => write!(f, "unevaluable: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub rule: String,
    pub binding: Binding,
    pub formula: String,
    pub outcome: Outcome,
}

impl RuleResult {
    pub fn new(rule: &GroundRule, outcome: Outcome) -> Self {
        Self {
            rule: rule.name.clone(),
            binding: rule.binding.clone(),
            formula: rule.formula.to_string(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub rule: String,
    pub formula: String,
    pub position: usize,
    pub reason: String,
}

impl From<&RejectedRule> for Rejection {
    fn from(rejected: &RejectedRule) -> Self {
        Self {
            rule: rejected.name.clone(),
            formula: rejected.text.clone(),
            position: rejected.error.position,
            reason: rejected.error.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub satisfied: usize,
    pub violated: usize,
    pub unevaluable: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;

        match outcome {
            Outcome::Satisfied => self.satisfied += 1,
            Outcome::Violated { .. } => self.violated += 1,
            Outcome::Unevaluable { .. } => self.unevaluable += 1,
        }
    }

    pub fn merge(&mut self, other: &Summary) {
        self.total += other.total;
        self.satisfied += other.satisfied;
        self.violated += other.violated;
        self.unevaluable += other.unevaluable;
    }

    /// Whether every evaluated rule was satisfied.
    pub fn passed(&self) -> bool {
        self.violated == 0 && self.unevaluable == 0
    }
}

impl<'a> FromIterator<&'a Outcome> for Summary {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = &'a Outcome>,
    {
        let mut summary = Self::default();

        for outcome in iter {
            summary.record(outcome);
        }

        summary
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rules: {} satisfied, {} violated, {} unevaluable",
            self.total, self.satisfied, self.violated, self.unevaluable
        )
    }
}

/// Outcomes of every ground rule for one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceReport {
    pub source: Option<String>,
    pub task_success: Option<bool>,
    pub results: Vec<RuleResult>,
    pub rejected: Vec<Rejection>,
    pub summary: Summary,
}

impl TraceReport {
    pub fn new(results: Vec<RuleResult>, rejected: Vec<Rejection>) -> Self {
        let summary = results.iter().map(|result| &result.outcome).collect();

        Self {
            source: None,
            task_success: None,
            results,
            rejected,
            summary,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_task_success(mut self, task_success: Option<bool>) -> Self {
        self.task_success = task_success;
        self
    }

    /// The outcome of a rule under a binding.
    pub fn get(&self, rule: &str, binding: &Binding) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|result| result.rule == rule && &result.binding == binding)
            .map(|result| &result.outcome)
    }

    pub fn passed(&self) -> bool {
        self.summary.passed()
    }
}

impl Display for TraceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source.as_deref().unwrap_or("<trace>"))?;

        if let Some(success) = self.task_success {
            write!(f, " (task success: {})", success)?;
        }

        writeln!(f)?;

        for result in &self.results {
            let status = match result.outcome {
                Outcome::Satisfied => "PASS",
                Outcome::Violated { .. } => "FAIL",
                Outcome::Unevaluable { .. } => "ERROR",
            };

            write!(f, "  [{}] {}", status, result.rule)?;

            if !result.binding.is_empty() {
                write!(f, " [{}]", result.binding)?;
            }

            writeln!(f, ": {}", result.outcome)?;
        }

        for rejection in &self.rejected {
            writeln!(
                f,
                "  [REJECTED] {}: {} ({} at offset {})",
                rejection.rule, rejection.formula, rejection.reason, rejection.position
            )?;
        }

        writeln!(f, "  {}", self.summary)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub traces: Vec<TraceReport>,
    pub summary: Summary,
}

impl BatchReport {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }
}

impl FromIterator<TraceReport> for BatchReport {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TraceReport>,
    {
        let traces: Vec<TraceReport> = iter.into_iter().collect();
        let mut summary = Summary::default();

        for trace in &traces {
            summary.merge(&trace.summary);
        }

        Self { traces, summary }
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for trace in &self.traces {
            writeln!(f, "{}", trace)?;
        }

        let failing = self.traces.iter().filter(|trace| !trace.passed()).count();

        writeln!(f, "{} traces, {} failing", self.traces.len(), failing)?;
        writeln!(f, "{}", self.summary)
    }
}
