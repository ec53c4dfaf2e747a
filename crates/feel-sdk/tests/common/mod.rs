//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use feel_sdk::{
    DecisionRule, DecisionTableDefinition, FType, FeelEngine, FeelEngineBuilder, HitPolicy,
    InputClause, Number, OutputClause, Value,
};

/// Engine with default configuration
pub fn engine() -> FeelEngine {
    FeelEngineBuilder::new()
        .build()
        .expect("default engine should build")
}

/// Context value from name/value pairs
pub fn input<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::context(entries)
}

/// Exact number from a literal
pub fn number(text: &str) -> Value {
    Value::Number(Number::parse_literal(text).expect("valid number literal"))
}

/// Rule from input tests and output entries
pub fn rule(inputs: &[&str], outputs: &[&str]) -> DecisionRule {
    let mut builder = DecisionRule::builder();
    for test in inputs {
        builder = builder.input(*test);
    }
    for entry in outputs {
        builder = builder.output(*entry);
    }
    builder.build()
}

/// The two-input greeting table
pub fn greeting_table() -> DecisionTableDefinition {
    DecisionTableDefinition::builder()
        .name("greeting")
        .input(InputClause::new("a + b"))
        .input(InputClause::new("a").with_allowed_values("1"))
        .output(OutputClause::unnamed())
        .rule(rule(&["3", "-"], &["\"hello world\""]))
        .rule(rule(&["2", "-"], &["\"hello world 2\""]))
        .hit_policy(HitPolicy::Unique)
        .build()
        .expect("greeting table is well formed")
}

/// Input type with numeric fields `a` and `b`
pub fn ab_type() -> FType {
    FType::context([("a", FType::NUMBER), ("b", FType::NUMBER)])
}
