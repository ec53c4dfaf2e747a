//! IR Program
//!
//! A program is a root IR tree with its constant pool and associated metadata.

use crate::ir::Ir;
use crate::types::{FType, Value};
use serde::Serialize;
use std::collections::HashMap;

/// Metadata key carrying the significant digits of decimal division
pub const DECIMAL_PRECISION_KEY: &str = "decimal_precision";

/// An IR program ready for loading by a compilation service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    /// Entry point name within its unit
    pub method_name: String,

    /// The expression tree
    pub root: Ir,

    /// Constants referenced by `Ir::ConstRef`
    pub constants: Vec<Value>,

    /// Static type of the result
    pub result_type: FType,

    /// Program metadata
    pub metadata: ProgramMetadata,
}

/// Metadata associated with a program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramMetadata {
    /// Compilation unit name
    pub unit_name: String,

    /// Source kind ("expression", "unary test" or "decision table")
    pub source_type: String,

    /// Original source text
    pub source: Option<String>,

    /// Warnings raised while compiling
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Custom metadata fields
    pub custom: HashMap<String, String>,

    /// Version of the compiler that generated this
    pub compiler_version: String,
}

impl Program {
    /// Create a new program
    pub fn new(method_name: impl Into<String>, root: Ir, metadata: ProgramMetadata) -> Self {
        Self {
            method_name: method_name.into(),
            root,
            constants: Vec::new(),
            result_type: FType::Any,
            metadata,
        }
    }

    /// Set the constant pool
    pub fn with_constants(mut self, constants: Vec<Value>) -> Self {
        self.constants = constants;
        self
    }

    /// Set the result type
    pub fn with_result_type(mut self, result_type: FType) -> Self {
        self.result_type = result_type;
        self
    }

    /// `unit.method`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.metadata.unit_name, self.method_name)
    }

    /// Get a pooled constant
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// Pretty JSON rendering of the whole program
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unrenderable program: {}>", e))
    }
}

impl ProgramMetadata {
    fn of_kind(unit_name: String, source_type: &str) -> Self {
        Self {
            unit_name,
            source_type: source_type.to_string(),
            source: None,
            warnings: Vec::new(),
            custom: HashMap::new(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create new metadata for an expression
    pub fn for_expression(unit_name: impl Into<String>) -> Self {
        Self::of_kind(unit_name.into(), "expression")
    }

    /// Create new metadata for a unary test
    pub fn for_unary_test(unit_name: impl Into<String>) -> Self {
        Self::of_kind(unit_name.into(), "unary test")
    }

    /// Create new metadata for a decision table
    pub fn for_decision_table(unit_name: impl Into<String>) -> Self {
        Self::of_kind(unit_name.into(), "decision table")
    }

    /// Set the source text
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the warnings
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Significant digits of decimal division the program was compiled for
    pub fn decimal_precision(&self) -> u64 {
        self.custom
            .get(DECIMAL_PRECISION_KEY)
            .and_then(|p| p.parse().ok())
            .unwrap_or(crate::types::number::DECIMAL_PRECISION)
    }

    /// Add a custom metadata field
    pub fn with_custom(mut self, key: String, value: String) -> Self {
        self.custom.insert(key, value);
        self
    }
}

impl Default for ProgramMetadata {
    fn default() -> Self {
        Self::of_kind("unknown".to_string(), "unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_creation() {
        let program = Program::new(
            "eval",
            Ir::ConstRef(0),
            ProgramMetadata::for_expression("Unit").with_source("\"hello\""),
        )
        .with_constants(vec![Value::from("hello")])
        .with_result_type(FType::String);

        assert_eq!(program.qualified_name(), "Unit.eval");
        assert_eq!(program.constant(0), Some(&Value::from("hello")));
        assert_eq!(program.constant(1), None);
        assert_eq!(program.metadata.source_type, "expression");
        assert_eq!(program.metadata.compiler_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_render() {
        let program = Program::new("eval", Ir::Input, ProgramMetadata::for_unary_test("T"));
        let rendered = program.render();
        assert!(rendered.contains("\"Input\""));
        assert!(rendered.contains("unary test"));
    }

    #[test]
    fn test_metadata_builders() {
        let metadata = ProgramMetadata::for_decision_table("table")
            .with_custom("author".to_string(), "ops".to_string())
            .with_warnings(vec!["w".to_string()]);
        assert_eq!(metadata.custom.get("author"), Some(&"ops".to_string()));
        assert_eq!(metadata.warnings.len(), 1);
        assert_eq!(ProgramMetadata::default().source_type, "unknown");
    }

    #[test]
    fn test_decimal_precision() {
        assert_eq!(ProgramMetadata::default().decimal_precision(), 34);
        let metadata = ProgramMetadata::default()
            .with_custom(DECIMAL_PRECISION_KEY.to_string(), "16".to_string());
        assert_eq!(metadata.decimal_precision(), 16);
    }
}
