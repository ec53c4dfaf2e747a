//! Builder pattern for FeelEngine

use crate::config::{CacheConfig, FeelConfig};
use crate::engine::FeelEngine;
use crate::error::{FeelError, Result};
use feel_compiler::factory::{self, FunctionFactories, TypeFactories};
use feel_compiler::{Compiler, CompilerOptions, FeelFunctionFactory, FeelTypeFactory};
use feel_runtime::{CompilationService, InterpreterService};
use std::sync::Arc;
use tracing::info;

/// Builder for FeelEngine
///
/// Providers are consulted in registration order; the default type and
/// function providers always come last.
///
/// # Example
///
/// ```rust,ignore
/// use feel_sdk::FeelEngineBuilder;
///
/// let engine = FeelEngineBuilder::new()
///     .with_function_factory(Arc::new(my_functions))
///     .with_decimal_precision(16)
///     .build()?;
/// ```
pub struct FeelEngineBuilder {
    config: FeelConfig,
    type_factories: Vec<Arc<dyn FeelTypeFactory>>,
    function_factories: Vec<Arc<dyn FeelFunctionFactory>>,
    service: Option<Arc<dyn CompilationService>>,
}

impl FeelEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: FeelConfig::new(),
            type_factories: Vec::new(),
            function_factories: Vec::new(),
            service: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: FeelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set compiler options
    pub fn with_compiler_options(mut self, options: CompilerOptions) -> Self {
        self.config.compiler = options;
        self
    }

    /// Set cache configuration
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    /// Enable constant folding
    pub fn enable_constant_folding(mut self, enable: bool) -> Self {
        self.config.compiler.enable_constant_folding = enable;
        self
    }

    /// Allow machine arithmetic for narrow numeric types
    pub fn native_arithmetic(mut self, enable: bool) -> Self {
        self.config.compiler.native_arithmetic = enable;
        self
    }

    /// Significant digits of decimal division
    pub fn with_decimal_precision(mut self, precision: u64) -> Self {
        self.config.compiler.decimal_precision = precision;
        self
    }

    /// Unknown names are errors (true) or dynamic lookups (false)
    pub fn strict_names(mut self, enable: bool) -> Self {
        self.config.compiler.strict_names = enable;
        self
    }

    /// Enable tracing
    pub fn enable_tracing(mut self, enable: bool) -> Self {
        self.config.enable_tracing = enable;
        self
    }

    /// Register a type provider ahead of the defaults
    pub fn with_type_factory(mut self, factory: Arc<dyn FeelTypeFactory>) -> Self {
        self.type_factories.push(factory);
        self
    }

    /// Register a function provider ahead of the defaults
    pub fn with_function_factory(mut self, factory: Arc<dyn FeelFunctionFactory>) -> Self {
        self.function_factories.push(factory);
        self
    }

    /// Load programs through a custom compilation service
    pub fn with_compilation_service(mut self, service: Arc<dyn CompilationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<FeelEngine> {
        if self.config.compiler.decimal_precision == 0 {
            return Err(FeelError::ConfigError(
                "decimal precision must be at least 1".to_string(),
            ));
        }

        let custom_types = self.type_factories.len();
        let custom_functions = self.function_factories.len();
        let types: TypeFactories = self
            .type_factories
            .into_iter()
            .chain(factory::default_type_factories().iter().cloned())
            .collect();
        let functions: FunctionFactories = self
            .function_factories
            .into_iter()
            .chain(factory::default_function_factories().iter().cloned())
            .collect();

        let compiler = Compiler::with_factories(self.config.compiler.clone(), types, functions);
        let service = self
            .service
            .unwrap_or_else(|| Arc::new(InterpreterService::new()) as Arc<dyn CompilationService>);

        info!(
            custom_types,
            custom_functions,
            cache = self.config.cache.enabled,
            decimal_precision = self.config.compiler.decimal_precision,
            "FEEL engine built"
        );
        Ok(FeelEngine::from_parts(self.config, compiler, service))
    }
}

impl Default for FeelEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
