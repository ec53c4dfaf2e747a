//! The compilation facade
//!
//! `FeelEngine` compiles FEEL expressions, unary tests and decision tables
//! into runtime capabilities. Every request is keyed by the normalized source
//! and the shape of its input types, and compiled at most once per key.

pub mod cache;
pub mod fingerprint;

use crate::config::FeelConfig;
use crate::error::{FeelError, Result};
use cache::ArtifactCache;
use feel_compiler::{CompileError, Compiler, CompilerTask};
use feel_core::dmn::DecisionTableDefinition;
use feel_core::ir::Program;
use feel_core::{FType, FeelTyped, Value};
use feel_runtime::{
    CompilationService, DecisionTable, EvalResult, Executable, Expression, InterpreterService,
    UnaryTest,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A compiled artifact as stored in the cache
#[derive(Clone)]
pub enum Artifact {
    Expression(Expression),
    UnaryTest(UnaryTest),
    DecisionTable(DecisionTable),
}

/// FEEL compilation facade
pub struct FeelEngine {
    config: FeelConfig,
    compiler: Compiler,
    service: Arc<dyn CompilationService>,
    cache: ArtifactCache<Artifact>,
    compilations: AtomicU64,
}

impl FeelEngine {
    /// Engine with the default configuration and providers
    pub fn new() -> Self {
        Self::from_parts(
            FeelConfig::default(),
            Compiler::new(),
            Arc::new(InterpreterService::new()),
        )
    }

    pub(crate) fn from_parts(
        config: FeelConfig,
        compiler: Compiler,
        service: Arc<dyn CompilationService>,
    ) -> Self {
        Self {
            config,
            compiler,
            service,
            cache: ArtifactCache::new(),
            compilations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &FeelConfig {
        &self.config
    }

    /// Number of compilations actually performed; cache hits do not count
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of cached artifacts
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached artifact
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ========== Expressions ==========

    /// Compile an expression over a root input of `input_type`
    pub fn compile_expression(&self, text: &str, input_type: FType) -> Result<Expression> {
        let source = fingerprint::normalize(text);
        let key = self.key("expression", &[&source, &input_type.to_string()]);
        let artifact = self.cached_or(&key, || {
            let task = CompilerTask::builder()
                .unit_name(fingerprint::unit_name(&key))
                .source(text)
                .input_type(input_type)
                .build();
            let program = self.compiler.compile_expression(&task).map_err(lift)?;
            Ok(Artifact::Expression(Expression::new(self.load(&task.unit_name, program)?)))
        })?;
        match artifact {
            Artifact::Expression(expression) => Ok(expression),
            _ => Err(FeelError::LoadError(key)),
        }
    }

    /// Compile an expression typed after a sample input
    pub fn compile_expression_for_value(&self, text: &str, sample: &Value) -> Result<Expression> {
        self.compile_expression(text, FType::of_value(sample))
    }

    /// Compile an expression over a host input type
    pub fn compile_expression_for<T: FeelTyped>(&self, text: &str) -> Result<Expression> {
        self.compile_expression(text, T::feel_type())
    }

    /// Compile and evaluate in one step
    pub fn evaluate(&self, text: &str, input: &Value) -> EvalResult {
        match self.compile_expression_for_value(text, input) {
            Ok(expression) => expression.eval(input),
            Err(err) => EvalResult::error(err.to_string()),
        }
    }

    // ========== Unary Tests ==========

    /// Compile unary tests; `?` has `test_input_type`
    pub fn compile_unary_test(
        &self,
        text: &str,
        test_input_type: FType,
        input_type: FType,
    ) -> Result<UnaryTest> {
        let source = fingerprint::normalize(text);
        let key = self.key(
            "unary test",
            &[&source, &test_input_type.to_string(), &input_type.to_string()],
        );
        let artifact = self.cached_or(&key, || {
            let task = CompilerTask::builder()
                .unit_name(fingerprint::unit_name(&key))
                .source(text)
                .test_input_type(test_input_type)
                .input_type(input_type)
                .build();
            let program = self.compiler.compile_unary_tests(&task).map_err(lift)?;
            Ok(Artifact::UnaryTest(UnaryTest::new(self.load(&task.unit_name, program)?)))
        })?;
        match artifact {
            Artifact::UnaryTest(test) => Ok(test),
            _ => Err(FeelError::LoadError(key)),
        }
    }

    /// Compile unary tests typed after sample values
    pub fn compile_unary_test_for_value(
        &self,
        text: &str,
        test_sample: &Value,
        input_sample: &Value,
    ) -> Result<UnaryTest> {
        self.compile_unary_test(
            text,
            FType::of_value(test_sample),
            FType::of_value(input_sample),
        )
    }

    /// Compile unary tests over a host input type
    pub fn compile_unary_test_for<T: FeelTyped>(
        &self,
        text: &str,
        test_input_type: FType,
    ) -> Result<UnaryTest> {
        self.compile_unary_test(text, test_input_type, T::feel_type())
    }

    // ========== Decision Tables ==========

    /// Compile a decision table over a root input of `input_type`
    pub fn compile_decision_table(
        &self,
        definition: &DecisionTableDefinition,
        input_type: FType,
    ) -> Result<DecisionTable> {
        let source = serde_json::to_string(definition)
            .map_err(|e| FeelError::ConfigError(format!("unserializable definition: {}", e)))?;
        let key = self.key("decision table", &[&source, &input_type.to_string()]);
        let artifact = self.cached_or(&key, || {
            let task = CompilerTask::builder()
                .unit_name(fingerprint::unit_name(&key))
                .input_type(input_type)
                .build();
            let program = self
                .compiler
                .compile_decision_table(definition, &task)
                .map_err(lift)?;
            let executable = self.load(&task.unit_name, program)?;
            Ok(Artifact::DecisionTable(DecisionTable::new(
                executable,
                Arc::new(definition.clone()),
            )))
        })?;
        match artifact {
            Artifact::DecisionTable(table) => Ok(table),
            _ => Err(FeelError::LoadError(key)),
        }
    }

    /// Compile a decision table typed after a sample input
    pub fn compile_decision_table_for_value(
        &self,
        definition: &DecisionTableDefinition,
        sample: &Value,
    ) -> Result<DecisionTable> {
        self.compile_decision_table(definition, FType::of_value(sample))
    }

    /// Compile a decision table over a host input type
    pub fn compile_decision_table_for<T: FeelTyped>(
        &self,
        definition: &DecisionTableDefinition,
    ) -> Result<DecisionTable> {
        self.compile_decision_table(definition, T::feel_type())
    }

    // ========== Internals ==========

    fn key(&self, kind: &str, parts: &[&str]) -> String {
        fingerprint::fingerprint(kind, parts, self.config.cache.fingerprint_hash_threshold)
    }

    fn cached_or<F>(&self, key: &str, compile: F) -> Result<Artifact>
    where
        F: FnOnce() -> Result<Artifact>,
    {
        let counted = || {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            compile()
        };
        if self.config.cache.enabled {
            self.cache.get_or_compile(key, counted)
        } else {
            counted()
        }
    }

    fn load(&self, unit_name: &str, program: Program) -> Result<Arc<dyn Executable>> {
        if self.config.enable_tracing {
            info!(unit = unit_name, kind = %program.metadata.source_type, "Compiled FEEL unit");
        } else {
            debug!(unit = unit_name, kind = %program.metadata.source_type, "Compiled FEEL unit");
        }
        let unit = self.service.compile(unit_name, program)?;
        unit.load_single()
            .ok_or_else(|| FeelError::LoadError(unit_name.to_string()))
    }
}

impl Default for FeelEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface syntax and definition errors as their own variants
fn lift(err: CompileError) -> FeelError {
    match err {
        CompileError::Syntax(err) => FeelError::ParseError(err),
        CompileError::Structural(err) => FeelError::DefinitionError(err),
        other => FeelError::CompileError(other),
    }
}
