//! FEEL SDK
//!
//! High-level API for compiling FEEL expressions, unary tests and DMN decision
//! tables, with a shared cache of compiled artifacts.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;

// Re-export main types
pub use builder::FeelEngineBuilder;
pub use config::{CacheConfig, FeelConfig};
pub use engine::{Artifact, FeelEngine};
pub use error::{FeelError, Result};

// Re-export commonly used types from dependencies
pub use feel_compiler::{CompilerOptions, FeelFunctionFactory, FeelTypeFactory, NativeFunctionFactory};
pub use feel_core::dmn::{
    Aggregation, DecisionRule, DecisionTableDefinition, HitPolicy, InputClause, OutputClause,
};
pub use feel_core::types::NativeFunction;
pub use feel_core::{FType, FeelTyped, Number, Value};
pub use feel_runtime::{DecisionTable, EvalResult, Expression, UnaryTest};
