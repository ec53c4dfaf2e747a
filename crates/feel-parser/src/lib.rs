//! FEEL Parser - source text to parse tree
//!
//! This crate provides a logos-based lexer and a recursive descent parser for
//! the two FEEL grammar roots: full expressions and unary-test lists.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod syntax;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use parser::{parse_expression, parse_unary_tests, PredictionMode};
pub use syntax::{Arguments, IterationSyntax, Syntax, SyntaxKind, TypeRef};
