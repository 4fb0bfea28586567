//! Checking recorded traces against a compiled rule set.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::builder::TraceBuilder;
use crate::config::MonitorConfig;
use crate::error::TraceError;
use crate::evaluator::check;
use crate::predicates::{ContentCount, OverloadPolicy, PredicateLibrary};
use crate::report::{BatchReport, Outcome, Rejection, RuleResult, TraceReport};
use crate::rules::{CompiledRules, RuleSet};
use crate::snapshot::{TraceRecord, TraceStep};

/// Evaluates every ground rule of a rule set over traces.
///
/// Rules that failed to parse are carried into every report as rejections and never evaluated.
/// A trace that cannot be built makes every ground rule unevaluable for that trace.
#[derive(Debug, Clone)]
pub struct Monitor<P = ContentCount> {
    builder: TraceBuilder<P>,
    rules: CompiledRules,
}

impl Monitor<ContentCount> {
    pub fn new(config: MonitorConfig, rules: &RuleSet) -> Self {
        Self::with_builder(TraceBuilder::new(config), rules.compile())
    }
}

impl<P> Monitor<P>
where
    P: OverloadPolicy,
{
    pub fn with_builder(builder: TraceBuilder<P>, rules: CompiledRules) -> Self {
        Self { builder, rules }
    }

    pub fn with_library(library: PredicateLibrary<P>, rules: &RuleSet) -> Self {
        Self::with_builder(TraceBuilder::with_library(library), rules.compile())
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Evaluate every ground rule over a trajectory.
    pub fn check_trace(&self, steps: &[TraceStep]) -> TraceReport {
        let results = match self.builder.build(steps) {
            Ok(trace) => self
                .rules
                .ground
                .iter()
                .map(|rule| {
                    let outcome = match check(&rule.formula, &trace) {
                        Ok(verdict) => Outcome::from(verdict),
                        Err(error) => Outcome::Unevaluable {
                            reason: error.to_string(),
                        },
                    };

                    tracing::debug!(rule = %rule.name, binding = %rule.binding, "{}", outcome);
                    RuleResult::new(rule, outcome)
                })
                .collect(),
            Err(error) => self.unevaluable(&error),
        };

        let rejected = self.rules.rejected.iter().map(Rejection::from).collect();
        TraceReport::new(results, rejected)
    }

    pub fn check_record(&self, record: &TraceRecord) -> TraceReport {
        self.check_trace(&record.trajectory).with_task_success(record.success)
    }

    /// Read and evaluate a trace file. Unreadable files yield a report of unevaluable rules.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn check_file<Q: AsRef<Path>>(&self, path: Q) -> TraceReport {
        let path = path.as_ref();
        let record = fs::read_to_string(path)
            .map_err(TraceError::from)
            .and_then(|contents| TraceRecord::from_json_str(&contents));

        let report = match record {
            Ok(record) => self.check_record(&record),
            Err(error) => {
                let rejected = self.rules.rejected.iter().map(Rejection::from).collect();
                TraceReport::new(self.unevaluable(&error), rejected)
            }
        };

        tracing::info!(
            satisfied = report.summary.satisfied,
            violated = report.summary.violated,
            unevaluable = report.summary.unevaluable,
            "checked trace"
        );

        report.with_source(path.display().to_string())
    }

    /// Check many trace files in parallel. Reports keep the order of the input paths.
    pub fn check_batch(&self, paths: &[PathBuf]) -> BatchReport
    where
        P: Sync,
    {
        let reports: Vec<TraceReport> =
            paths.par_iter().map(|path| self.check_file(path)).collect();
        reports.into_iter().collect()
    }

    fn unevaluable(&self, error: &TraceError) -> Vec<RuleResult> {
        tracing::warn!("trace cannot be evaluated: {}", error);

        self.rules
            .ground
            .iter()
            .map(|rule| {
                let outcome = Outcome::Unevaluable {
                    reason: error.to_string(),
                };

                RuleResult::new(rule, outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use serde_json::{json, Value};

    use super::Monitor;
    use crate::config::MonitorConfig;
    use crate::report::Outcome;
    use crate::rules::{Binding, RuleSet, RuleSpec};
    use crate::snapshot::TraceStep;

    fn steps(value: Value) -> Vec<TraceStep> {
        serde_json::from_value(value).expect("steps should deserialize")
    }

    fn stove(on: bool) -> Value {
        json!({
            "objects": [
                {"objectId": "StoveBurner|1", "objectType": "StoveBurner",
                 "toggleable": true, "isToggled": on}
            ]
        })
    }

    fn monitor() -> Result<Monitor, Box<dyn Error>> {
        let rules = RuleSet::new(vec![
            RuleSpec::new("stove-off", "G(!ISON(StoveBurner))"),
            RuleSpec::new("broken", "G(ISON(StoveBurner)"),
        ])?;

        Ok(Monitor::new(MonitorConfig::default(), &rules))
    }

    #[test]
    fn reports_violations_and_rejections() -> Result<(), Box<dyn Error>> {
        let trajectory = steps(json!([
            {"step": 0, "event_metadata": stove(false)},
            {"step": 1, "thor_action": {"action": "ToggleObjectOn", "objectId": "StoveBurner|1"},
             "event_metadata": stove(true)}
        ]));
        let report = monitor()?.check_trace(&trajectory);

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].rule, "broken");
        assert!(matches!(
            report.get("stove-off", &Binding::new()),
            Some(Outcome::Violated { state: 1, element: 2, .. })
        ));

        Ok(())
    }

    #[test]
    fn structural_errors_make_rules_unevaluable() -> Result<(), Box<dyn Error>> {
        let trajectory = steps(json!([
            {"step": 0, "event_metadata": stove(false)},
            {"step": 1}
        ]));
        let report = monitor()?.check_trace(&trajectory);

        assert_eq!(report.summary.unevaluable, 1);
        assert_eq!(
            report.get("stove-off", &Binding::new()),
            Some(&Outcome::Unevaluable {
                reason: "Step 1 has no event_metadata".to_string()
            })
        );

        Ok(())
    }

    #[test]
    fn missing_files_are_unevaluable() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let report = monitor()?.check_file(dir.path().join("absent.json"));

        assert_eq!(report.summary.unevaluable, 1);
        assert!(!report.passed());

        Ok(())
    }
}
