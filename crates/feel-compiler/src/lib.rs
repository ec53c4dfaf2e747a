//! FEEL Compiler - FEEL source to IR
//!
//! This crate turns FEEL expressions, unary tests and DMN decision tables into
//! IR programs. Compilation runs in three passes: the AST builder resolves
//! names and types over the parse tree, the AST compiler lowers typed nodes
//! through the type and function factories, and the constant folder simplifies
//! the result.

pub mod builder;
pub mod codegen;
pub mod compiler;
pub mod context;
pub mod dmn;
pub mod error;
pub mod factory;
pub mod optimizer;
pub mod task;

// Re-export main types
pub use compiler::{Compiler, CompilerOptions};
pub use context::TranslationContext;
pub use error::{CompileError, Result};
pub use task::{CompilerTask, CompilerTaskBuilder};

// Re-export extension points
pub use codegen::CodeFragment;
pub use factory::{
    BuiltinFunctionFactory, DefaultTypeFactory, FeelFunctionFactory, FeelTypeFactory,
    NativeFunctionFactory,
};

// Re-export passes
pub use builder::AstBuilder;
pub use codegen::AstCompiler;
pub use dmn::DecisionTableGenerator;
pub use optimizer::ConstantFolder;
