//! Decision table definition model

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structural violations of a decision table definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("decision table '{0}' has no input clauses")]
    NoInputs(String),

    #[error("decision table '{0}' has no output clauses")]
    NoOutputs(String),

    #[error("rule {rule} has {actual} input entries, expected {expected}")]
    InputArity {
        rule: usize,
        expected: usize,
        actual: usize,
    },

    #[error("rule {rule} has {actual} output entries, expected {expected}")]
    OutputArity {
        rule: usize,
        expected: usize,
        actual: usize,
    },

    #[error("output clause {0} must be named when the table has several outputs")]
    UnnamedOutput(usize),

    #[error("aggregation {aggregation} requires hit policy COLLECT, found {hit_policy}")]
    AggregationWithoutCollect {
        aggregation: Aggregation,
        hit_policy: HitPolicy,
    },

    #[error("aggregation {0} requires a single output clause")]
    AggregationWithSeveralOutputs(Aggregation),

    #[error("decision table name must not be empty")]
    EmptyName,
}

/// Rule hit policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HitPolicy {
    /// At most one rule may match
    #[default]
    Unique,
    /// First matching rule in declaration order
    First,
    /// Matching rule with the highest output priority
    Priority,
    /// All matching rules must agree
    Any,
    /// All matches, optionally aggregated
    Collect,
    /// All matches in declaration order
    RuleOrder,
    /// All matches sorted by output priority
    OutputOrder,
}

impl HitPolicy {
    /// Returns true for policies returning every match
    pub fn is_multi_hit(&self) -> bool {
        matches!(
            self,
            HitPolicy::Collect | HitPolicy::RuleOrder | HitPolicy::OutputOrder
        )
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HitPolicy::Unique => "UNIQUE",
            HitPolicy::First => "FIRST",
            HitPolicy::Priority => "PRIORITY",
            HitPolicy::Any => "ANY",
            HitPolicy::Collect => "COLLECT",
            HitPolicy::RuleOrder => "RULE ORDER",
            HitPolicy::OutputOrder => "OUTPUT ORDER",
        };
        f.write_str(name)
    }
}

/// COLLECT aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    Sum,
    Min,
    Max,
    Count,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Sum => "SUM",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Count => "COUNT",
        };
        f.write_str(name)
    }
}

/// Input column header
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputClause {
    /// FEEL expression producing the column value
    pub expression: String,
    /// Unary tests substituted for `-` cells
    pub allowed_values: Option<String>,
}

impl InputClause {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            allowed_values: None,
        }
    }

    /// Restrict `-` cells to the given unary tests
    pub fn with_allowed_values(mut self, allowed: impl Into<String>) -> Self {
        self.allowed_values = Some(allowed.into());
        self
    }
}

/// Output column header
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputClause {
    /// Required when the table has more than one output
    pub name: Option<String>,
    /// Unary tests every produced value must satisfy; their order is the output priority
    pub allowed_values: Option<String>,
    /// FEEL expression used when no rule matches
    pub default_entry: Option<String>,
}

impl OutputClause {
    /// An unnamed output, for single-output tables
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_allowed_values(mut self, allowed: impl Into<String>) -> Self {
        self.allowed_values = Some(allowed.into());
        self
    }

    pub fn with_default(mut self, entry: impl Into<String>) -> Self {
        self.default_entry = Some(entry.into());
        self
    }
}

/// One row of the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionRule {
    /// Unary tests, one per input clause
    pub input_entries: Vec<String>,
    /// Literal expressions, one per output clause
    pub output_entries: Vec<String>,
    #[serde(default)]
    pub annotation_entries: Vec<String>,
}

impl DecisionRule {
    pub fn builder() -> DecisionRuleBuilder {
        DecisionRuleBuilder::default()
    }
}

/// Builder for [`DecisionRule`]
#[derive(Debug, Default)]
pub struct DecisionRuleBuilder {
    rule: DecisionRule,
}

impl DecisionRuleBuilder {
    /// Append an input entry
    pub fn input(mut self, test: impl Into<String>) -> Self {
        self.rule.input_entries.push(test.into());
        self
    }

    /// Append an output entry
    pub fn output(mut self, expression: impl Into<String>) -> Self {
        self.rule.output_entries.push(expression.into());
        self
    }

    /// Append an annotation entry
    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.rule.annotation_entries.push(annotation.into());
        self
    }

    pub fn build(self) -> DecisionRule {
        self.rule
    }
}

/// A complete decision table definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionTableDefinition {
    pub name: String,
    pub inputs: Vec<InputClause>,
    pub outputs: Vec<OutputClause>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub rules: Vec<DecisionRule>,
    #[serde(default)]
    pub hit_policy: HitPolicy,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

impl DecisionTableDefinition {
    /// Create a definition, checking its structural invariants
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<InputClause>,
        outputs: Vec<OutputClause>,
        rules: Vec<DecisionRule>,
        hit_policy: HitPolicy,
        aggregation: Option<Aggregation>,
    ) -> Result<Self, DefinitionError> {
        let definition = Self {
            name: name.into(),
            inputs,
            outputs,
            annotations: Vec::new(),
            rules,
            hit_policy,
            aggregation,
        };
        definition.validate()?;
        log::debug!(
            "Loaded decision table '{}' with {} rules",
            definition.name,
            definition.rules.len()
        );
        Ok(definition)
    }

    pub fn builder() -> DecisionTableBuilder {
        DecisionTableBuilder::default()
    }

    /// Parse a JSON definition and check its structural invariants
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let definition: Self =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidValue(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Check the structural invariants
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if self.inputs.is_empty() {
            return Err(DefinitionError::NoInputs(self.name.clone()));
        }
        if self.outputs.is_empty() {
            return Err(DefinitionError::NoOutputs(self.name.clone()));
        }
        if self.outputs.len() > 1 {
            if let Some(index) = self.outputs.iter().position(|o| o.name.is_none()) {
                return Err(DefinitionError::UnnamedOutput(index + 1));
            }
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.input_entries.len() != self.inputs.len() {
                return Err(DefinitionError::InputArity {
                    rule: index + 1,
                    expected: self.inputs.len(),
                    actual: rule.input_entries.len(),
                });
            }
            if rule.output_entries.len() != self.outputs.len() {
                return Err(DefinitionError::OutputArity {
                    rule: index + 1,
                    expected: self.outputs.len(),
                    actual: rule.output_entries.len(),
                });
            }
        }
        if let Some(aggregation) = self.aggregation {
            if self.hit_policy != HitPolicy::Collect {
                return Err(DefinitionError::AggregationWithoutCollect {
                    aggregation,
                    hit_policy: self.hit_policy,
                });
            }
            if self.outputs.len() != 1 {
                return Err(DefinitionError::AggregationWithSeveralOutputs(aggregation));
            }
        }
        Ok(())
    }

    /// A single unnamed output produces bare values instead of contexts
    pub fn has_single_unnamed_output(&self) -> bool {
        self.outputs.len() == 1 && self.outputs[0].name.is_none()
    }
}

/// Builder for [`DecisionTableDefinition`]
#[derive(Debug, Default)]
pub struct DecisionTableBuilder {
    name: String,
    inputs: Vec<InputClause>,
    outputs: Vec<OutputClause>,
    annotations: Vec<String>,
    rules: Vec<DecisionRule>,
    hit_policy: HitPolicy,
    aggregation: Option<Aggregation>,
}

impl DecisionTableBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn input(mut self, input: InputClause) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn output(mut self, output: OutputClause) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn rule(mut self, rule: DecisionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn hit_policy(mut self, hit_policy: HitPolicy) -> Self {
        self.hit_policy = hit_policy;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Build and validate the definition
    pub fn build(self) -> Result<DecisionTableDefinition, DefinitionError> {
        let definition = DecisionTableDefinition {
            name: self.name,
            inputs: self.inputs,
            outputs: self.outputs,
            annotations: self.annotations,
            rules: self.rules,
            hit_policy: self.hit_policy,
            aggregation: self.aggregation,
        };
        definition.validate()?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(inputs: &[&str], outputs: &[&str]) -> DecisionRule {
        let mut builder = DecisionRule::builder();
        for i in inputs {
            builder = builder.input(*i);
        }
        for o in outputs {
            builder = builder.output(*o);
        }
        builder.build()
    }

    #[test]
    fn test_valid_definition() {
        let definition = DecisionTableDefinition::builder()
            .name("simple")
            .input(InputClause::new("a+b"))
            .input(InputClause::new("a").with_allowed_values("1"))
            .output(OutputClause::unnamed())
            .rule(rule(&["3", "-"], &["\"hello\""]))
            .build()
            .unwrap();
        assert_eq!(definition.hit_policy, HitPolicy::Unique);
        assert!(definition.has_single_unnamed_output());
    }

    #[test]
    fn test_rule_arity_is_checked() {
        let err = DecisionTableDefinition::builder()
            .name("arity")
            .input(InputClause::new("a"))
            .output(OutputClause::unnamed())
            .rule(rule(&["1", "2"], &["3"]))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::InputArity {
                rule: 1,
                expected: 1,
                actual: 2
            }
        );

        let err = DecisionTableDefinition::builder()
            .name("arity")
            .input(InputClause::new("a"))
            .output(OutputClause::unnamed())
            .rule(rule(&["1"], &[]))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::OutputArity { .. }));
    }

    #[test]
    fn test_empty_clauses_are_rejected() {
        let err = DecisionTableDefinition::new(
            "empty",
            vec![],
            vec![OutputClause::unnamed()],
            vec![],
            HitPolicy::First,
            None,
        )
        .unwrap_err();
        assert_eq!(err, DefinitionError::NoInputs("empty".into()));
    }

    #[test]
    fn test_multiple_outputs_need_names() {
        let err = DecisionTableDefinition::builder()
            .name("outputs")
            .input(InputClause::new("a"))
            .output(OutputClause::named("x"))
            .output(OutputClause::unnamed())
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::UnnamedOutput(2));
    }

    #[test]
    fn test_aggregation_requires_collect() {
        let err = DecisionTableDefinition::builder()
            .name("agg")
            .input(InputClause::new("a"))
            .output(OutputClause::unnamed())
            .hit_policy(HitPolicy::First)
            .aggregation(Aggregation::Sum)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("requires hit policy COLLECT"));
    }

    #[test]
    fn test_multi_hit() {
        assert!(HitPolicy::Collect.is_multi_hit());
        assert!(HitPolicy::OutputOrder.is_multi_hit());
        assert!(!HitPolicy::Priority.is_multi_hit());
        assert_eq!(HitPolicy::RuleOrder.to_string(), "RULE ORDER");
    }

    #[test]
    fn test_from_json() -> anyhow::Result<()> {
        let json = r#"{
            "name": "t",
            "inputs": [{"expression": "x"}],
            "outputs": [{"name": null}],
            "rules": [{"input_entries": ["> 1"], "output_entries": ["\"big\""]}],
            "hit_policy": "FIRST"
        }"#;
        let definition = DecisionTableDefinition::from_json(json)?;
        assert_eq!(definition.hit_policy, HitPolicy::First);
        assert_eq!(definition.rules[0].output_entries, vec!["\"big\"".to_string()]);

        let unbalanced = json.replace(r#"["> 1"]"#, r#"["> 1", "-"]"#);
        assert!(matches!(
            DecisionTableDefinition::from_json(&unbalanced),
            Err(CoreError::Definition(DefinitionError::InputArity { .. }))
        ));
        assert!(matches!(
            DecisionTableDefinition::from_json("{"),
            Err(CoreError::InvalidValue(_))
        ));
        Ok(())
    }
}
