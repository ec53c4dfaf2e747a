//! Abstract Syntax Tree (AST) definitions
//!
//! The AST is built once per compile from the parser's syntax tree. Every node
//! carries its resolved FEEL type, its source span and any comments or warnings
//! attached during construction.

pub mod node;
pub mod operator;

pub use node::{AstNode, Callee, ContextEntry, FilterKind, Iteration, NameOrigin, NodeKind};
pub use operator::InfixOp;
