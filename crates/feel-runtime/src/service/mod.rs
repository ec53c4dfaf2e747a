//! Compilation service
//!
//! A `CompilationService` turns an IR `Program` into an `ExecutableUnit`. The
//! default `InterpreterService` validates the program and evaluates it with
//! the tree-walking interpreter.

pub mod interpreted;

pub use interpreted::{InterpretedProgram, InterpreterService};

use crate::error::{CompilationError, Result};
use feel_core::ir::Program;
use feel_core::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A loaded, callable program
pub trait Executable: Send + Sync {
    /// Run with the root input and, for unary tests, the test input `?`
    fn execute(&self, input: &Value, test_input: Option<&Value>) -> Result<Value>;

    /// The program this executable was loaded from
    fn program(&self) -> &Program;
}

/// Turns programs into executable units
pub trait CompilationService: Send + Sync {
    fn compile(
        &self,
        unit_name: &str,
        program: Program,
    ) -> std::result::Result<ExecutableUnit, CompilationError>;
}

/// Executables of one compilation unit, by qualified name
#[derive(Clone)]
pub struct ExecutableUnit {
    name: String,
    entries: HashMap<String, Arc<dyn Executable>>,
}

impl ExecutableUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Add an executable under `qualified_name`
    pub fn with(mut self, qualified_name: impl Into<String>, executable: Arc<dyn Executable>) -> Self {
        self.entries.insert(qualified_name.into(), executable);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The only executable of the unit
    pub fn load_single(&self) -> Option<Arc<dyn Executable>> {
        match self.entries.len() {
            1 => self.entries.values().next().cloned(),
            _ => None,
        }
    }

    /// Executable registered under `qualified_name` (`unit.method`)
    pub fn load(&self, qualified_name: &str) -> Option<Arc<dyn Executable>> {
        self.entries.get(qualified_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ExecutableUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ExecutableUnit")
            .field("name", &self.name)
            .field("entries", &names)
            .finish()
    }
}
