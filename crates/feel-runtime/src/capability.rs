//! Compiled capabilities
//!
//! Thin handles over an `Executable`, one per kind of compiled artifact. They
//! are cheap to clone and safe to share between threads.

use crate::result::EvalResult;
use crate::service::Executable;
use feel_core::dmn::DecisionTableDefinition;
use feel_core::ir::Program;
use feel_core::{FType, Value};
use std::sync::Arc;
use tracing::warn;

/// A compiled FEEL expression
#[derive(Clone)]
pub struct Expression {
    executable: Arc<dyn Executable>,
}

impl Expression {
    pub fn new(executable: Arc<dyn Executable>) -> Self {
        Self { executable }
    }

    /// Evaluate against a root input
    pub fn eval(&self, input: &Value) -> EvalResult {
        report(self.program(), self.executable.execute(input, None))
    }

    pub fn program(&self) -> &Program {
        self.executable.program()
    }

    pub fn result_type(&self) -> &FType {
        &self.program().result_type
    }

    pub fn source(&self) -> &str {
        self.program().metadata.source.as_deref().unwrap_or_default()
    }
}

/// Compiled unary tests
#[derive(Clone)]
pub struct UnaryTest {
    executable: Arc<dyn Executable>,
}

impl UnaryTest {
    pub fn new(executable: Arc<dyn Executable>) -> Self {
        Self { executable }
    }

    /// Whether `test_input` passes. Null and errors count as failing.
    pub fn test(&self, test_input: &Value, input: &Value) -> bool {
        self.evaluate(test_input, input).as_bool() == Some(true)
    }

    /// Full three-valued outcome
    pub fn evaluate(&self, test_input: &Value, input: &Value) -> EvalResult {
        report(
            self.program(),
            self.executable.execute(input, Some(test_input)),
        )
    }

    pub fn program(&self) -> &Program {
        self.executable.program()
    }

    pub fn source(&self) -> &str {
        self.program().metadata.source.as_deref().unwrap_or_default()
    }
}

/// A compiled DMN decision table
#[derive(Clone)]
pub struct DecisionTable {
    executable: Arc<dyn Executable>,
    definition: Arc<DecisionTableDefinition>,
}

impl DecisionTable {
    pub fn new(executable: Arc<dyn Executable>, definition: Arc<DecisionTableDefinition>) -> Self {
        Self {
            executable,
            definition,
        }
    }

    /// Evaluate the table for one input
    pub fn evaluate(&self, input: &Value) -> EvalResult {
        report(self.program(), self.executable.execute(input, None))
    }

    pub fn definition(&self) -> &DecisionTableDefinition {
        &self.definition
    }

    /// JSON rendering of the definition the table was compiled from
    pub fn source(&self) -> &str {
        self.program().metadata.source.as_deref().unwrap_or_default()
    }

    pub fn program(&self) -> &Program {
        self.executable.program()
    }

    pub fn result_type(&self) -> &FType {
        &self.program().result_type
    }
}

fn report(program: &Program, outcome: crate::error::Result<Value>) -> EvalResult {
    match outcome {
        Ok(value) => EvalResult::of(value),
        Err(err) => {
            warn!(unit = %program.qualified_name(), error = %err, "Evaluation failed");
            EvalResult::error(err.to_string())
        }
    }
}

macro_rules! debug_capability {
    ($($name:ident),*) => {$(
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("unit", &self.program().qualified_name())
                    .field("result_type", &self.program().result_type.to_string())
                    .finish()
            }
        }
    )*};
}

debug_capability!(Expression, UnaryTest, DecisionTable);
