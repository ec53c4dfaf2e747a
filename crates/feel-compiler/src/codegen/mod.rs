//! Code generation
//!
//! Lowers typed AST nodes to IR.

pub mod ast_compiler;
pub mod fragment;

pub use ast_compiler::AstCompiler;
pub use fragment::CodeFragment;
