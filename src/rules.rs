//! Loading and compiling rule sets.
//!
//! A rule set is a list of named formulas, each with optional bindings from placeholder names to
//! object types. Rule sets are read from JSON, TOML or plain text:
//!
//! ```json
//! {"rules": [{"name": "no-metal",
//!             "formula": "G(INSIDE(x, Microwave) -> !ISNOTMICROWAVEMATERIAL(x))",
//!             "bindings": [{"x": "Fork"}, {"x": "Knife"}]}]}
//! ```
//!
//! The older `{"safety_constraints": ["..."]}` form and bare lists of formulas are accepted as
//! well. In text files every non-blank line not starting with `#` is a formula.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuleSetError;
use crate::formula::Expr;
use crate::parser::{parse_formula, ParseError};

/// Assignment of object types to the placeholders of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, String>);

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0.get(placeholder).map(String::as_str)
    }

    pub fn substitutions(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl<K, V> FromIterator<(K, V)> for Binding
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Renders as `placeholder=Type, ...`, which is empty for the empty binding.
impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, (placeholder, value)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            write!(f, "{}={}", placeholder, value)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub formula: String,

    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            bindings: Vec::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: Vec<Binding>) -> Self {
        self.bindings = bindings;
        self
    }
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    #[serde(default)]
    name: Option<String>,
    formula: String,
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleEntry {
    Formula(String),
    Named(NamedEntry),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleDocument {
    Rules { rules: Vec<RuleEntry> },
    Legacy { safety_constraints: Vec<RuleEntry> },
    List(Vec<RuleEntry>),
}

impl RuleDocument {
    fn into_specs(self) -> Vec<RuleSpec> {
        let entries = match self {
            Self::Rules { rules } => rules,
            Self::Legacy { safety_constraints } => safety_constraints,
            Self::List(entries) => entries,
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let default_name = || format!("rule-{}", index + 1);

                match entry {
                    RuleEntry::Formula(formula) => RuleSpec::new(default_name(), formula),
                    RuleEntry::Named(named) => RuleSpec {
                        name: named.name.unwrap_or_else(default_name),
                        formula: named.formula,
                        bindings: named.bindings,
                    },
                }
            })
            .collect()
    }
}

/// A rule with every placeholder replaced by its bound type.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundRule {
    pub name: String,
    pub binding: Binding,
    pub formula: Expr,
}

/// A rule whose formula could not be parsed. It is excluded from evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRule {
    pub name: String,
    pub text: String,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRules {
    pub ground: Vec<GroundRule>,
    pub rejected: Vec<RejectedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RuleSpec>,
}

impl RuleSet {
    pub fn new(rules: Vec<RuleSpec>) -> Result<Self, RuleSetError> {
        if rules.is_empty() {
            return Err(RuleSetError::Empty);
        }

        Ok(Self { rules })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, RuleSetError> {
        let document: RuleDocument = serde_json::from_str(contents)?;
        Self::new(document.into_specs())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RuleSetError> {
        let document: RuleDocument = toml::from_str(contents)?;
        Self::new(document.into_specs())
    }

    /// One formula per line. Rules are named after their line number.
    pub fn from_text(contents: &str) -> Result<Self, RuleSetError> {
        let rules = contents
            .lines()
            .enumerate()
            .map(|(index, line)| (index, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(index, line)| RuleSpec::new(format!("line-{}", index + 1), line))
            .collect();

        Self::new(rules)
    }

    /// Read a rule set, choosing the format from the file extension.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        let rules = match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents)?,
            Some("toml") => Self::from_toml_str(&contents)?,
            _ => Self::from_text(&contents)?,
        };

        tracing::debug!(rules = rules.len(), "loaded rule set");
        Ok(rules)
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse every rule and ground it against each of its bindings.
    pub fn compile(&self) -> CompiledRules {
        let mut compiled = CompiledRules::default();

        for spec in &self.rules {
            let formula = match parse_formula(&spec.formula) {
                Ok(formula) => formula,
                Err(error) => {
                    tracing::warn!(
                        rule = %spec.name,
                        position = error.position,
                        "rejected rule: {}",
                        error
                    );

                    compiled.rejected.push(RejectedRule {
                        name: spec.name.clone(),
                        text: spec.formula.clone(),
                        error,
                    });

                    continue;
                }
            };

            if spec.bindings.is_empty() {
                compiled.ground.push(GroundRule {
                    name: spec.name.clone(),
                    binding: Binding::new(),
                    formula,
                });

                continue;
            }

            for binding in &spec.bindings {
                compiled.ground.push(GroundRule {
                    name: spec.name.clone(),
                    binding: binding.clone(),
                    formula: formula.ground(binding.substitutions()),
                });
            }
        }

        compiled
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{Binding, RuleSet, RuleSpec};
    use crate::error::RuleSetError;
    use crate::formula::Expr;
    use crate::parser::ParseErrorKind;
    use crate::predicates::PredicateKind;

    #[test]
    fn json_rules() -> Result<(), Box<dyn Error>> {
        let rules = RuleSet::from_json_str(
            r#"{"rules": [
                {"name": "no-metal",
                 "formula": "G(INSIDE(x, Microwave) -> !ISNOTMICROWAVEMATERIAL(x))",
                 "bindings": [{"x": "Fork"}, {"x": "Knife"}]},
                {"formula": "G(NOT(OVERLOAD(Shelf)))"}
            ]}"#,
        )?;

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].bindings.len(), 2);
        assert_eq!(rules.rules()[1].name, "rule-2");

        Ok(())
    }

    #[test]
    fn legacy_and_list_forms() -> Result<(), Box<dyn Error>> {
        let legacy = RuleSet::from_json_str(
            r#"{"safety_constraints": ["G(ISON(StoveBurner) -> not(CLOSE(Book, StoveBurner)))"]}"#,
        )?;
        let list = RuleSet::from_json_str(
            r#"["G(NOT(OVERLOAD(Shelf)))", {"name": "n", "formula": "F(HELD(Apple))"}]"#,
        )?;

        assert_eq!(legacy.rules()[0].name, "rule-1");
        assert_eq!(list.rules()[1].name, "n");

        Ok(())
    }

    #[test]
    fn toml_rules() -> Result<(), Box<dyn Error>> {
        let rules = RuleSet::from_toml_str(
            r#"
            [[rules]]
            name = "no-metal"
            formula = "AG(IN(x, Microwave) -> !ISNOTMICROWAVEMATERIAL(x))"
            bindings = [{ x = "Fork" }]
            "#,
        )?;

        assert_eq!(rules.rules()[0].name, "no-metal");
        assert_eq!(rules.rules()[0].bindings[0].get("x"), Some("Fork"));

        Ok(())
    }

    #[test]
    fn text_rules() -> Result<(), Box<dyn Error>> {
        let rules = RuleSet::from_text(concat!(
            "# stove\n\n",
            "G(ISON(StoveBurner) -> !CLOSE(Book, StoveBurner))\n",
            "  G(!COLLISION(Agent))\n",
        ))?;
        let names: Vec<&str> = rules.rules().iter().map(|rule| rule.name.as_str()).collect();

        assert_eq!(names, vec!["line-3", "line-4"]);
        assert!(matches!(RuleSet::from_text("# nothing\n"), Err(RuleSetError::Empty)));

        Ok(())
    }

    #[test]
    fn compile_grounds_and_rejects() -> Result<(), Box<dyn Error>> {
        let rules = RuleSet::new(vec![
            RuleSpec::new("no-metal", "G(INSIDE(x, Microwave) -> !ISNOTMICROWAVEMATERIAL(x))")
                .with_bindings(vec![
                    Binding::from_iter([("x", "Fork")]),
                    Binding::from_iter([("x", "Spoon")]),
                ]),
            RuleSpec::new("broken", "G(ISON(a) XOR ISON(b))"),
            RuleSpec::new("shelf", "G(!OVERLOAD(Shelf))"),
        ])?;
        let compiled = rules.compile();

        assert_eq!(compiled.ground.len(), 3);
        assert_eq!(compiled.ground[1].binding.to_string(), "x=Spoon");
        assert_eq!(
            compiled.ground[1].formula,
            Expr::always(Expr::implies(
                Expr::atom(PredicateKind::Inside, ["Spoon", "Microwave"]),
                !Expr::atom(PredicateKind::IsNotMicrowaveMaterial, ["Spoon"]),
            ))
        );
        assert!(compiled.ground[2].binding.is_empty());

        assert_eq!(compiled.rejected.len(), 1);
        assert_eq!(compiled.rejected[0].name, "broken");
        assert_eq!(
            compiled.rejected[0].error.kind,
            ParseErrorKind::UnknownOperator("XOR".to_string())
        );

        Ok(())
    }
}
