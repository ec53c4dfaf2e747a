//! Decision table IR

use crate::dmn::{Aggregation, HitPolicy};
use crate::ir::Ir;
use serde::Serialize;

/// A decision table lowered to a rule matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionIr {
    pub name: String,
    /// One expression per input clause, evaluated once per evaluation
    pub inputs: Vec<Ir>,
    pub rules: Vec<RuleIr>,
    pub outputs: Vec<OutputIr>,
    pub hit_policy: HitPolicy,
    pub aggregation: Option<Aggregation>,
    /// Produce bare values rather than contexts
    pub single_output: bool,
}

/// One row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleIr {
    /// One test per input clause, evaluated with `?` bound to the input value
    pub conditions: Vec<Ir>,
    /// One expression per output clause
    pub outputs: Vec<Ir>,
}

/// Output column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputIr {
    pub name: Option<String>,
    /// Allowed-values check, evaluated with `?` bound to the produced value
    pub check: Option<Ir>,
    /// The allowed-values tests one by one; the first match gives the priority
    pub priorities: Vec<Ir>,
    pub default: Option<Ir>,
}

impl DecisionIr {
    /// All expressions of the table
    pub fn children(&self) -> Vec<&Ir> {
        let mut children: Vec<&Ir> = self.inputs.iter().collect();
        for rule in &self.rules {
            children.extend(rule.conditions.iter());
            children.extend(rule.outputs.iter());
        }
        for output in &self.outputs {
            children.extend(output.check.iter());
            children.extend(output.priorities.iter());
            children.extend(output.default.iter());
        }
        children
    }
}
