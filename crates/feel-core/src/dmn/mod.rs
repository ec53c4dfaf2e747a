//! DMN decision table definitions
//!
//! A definition is the textual form of a decision table: FEEL source for every
//! input clause, cell and output entry. Structural invariants are checked when the
//! definition is constructed.

pub mod definition;

pub use definition::{
    Aggregation, DecisionRule, DecisionRuleBuilder, DecisionTableBuilder,
    DecisionTableDefinition, DefinitionError, HitPolicy, InputClause, OutputClause,
};
