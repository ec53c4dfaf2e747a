//! FEEL Core - shared types for the FEEL compiler
//!
//! This crate provides the fundamental types used across the FEEL workspace:
//! - The FEEL type lattice and runtime values
//! - AST (Abstract Syntax Tree) definitions
//! - IR (Intermediate Representation) definitions
//! - DMN decision table definitions
//! - Value operator kernels shared by the interpreter and the constant folder
//! - Error types

pub mod ast;
pub mod dmn;
pub mod error;
pub mod ir;
pub mod ops;
pub mod span;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use span::SourceSpan;
pub use types::{CompatRank, FType, FeelTyped, Number, NumberKind, Value};
