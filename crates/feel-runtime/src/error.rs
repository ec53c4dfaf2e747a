//! Runtime error types

use thiserror::Error;

/// Evaluation error
///
/// FEEL semantics turn most faults into null. These are the conditions that
/// fail an evaluation outright and surface as an error `EvalResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// More than one rule matched a UNIQUE table, or ANY rules disagree
    #[error("{hit_policy} hit policy violated in '{decision}': {message}")]
    HitPolicy {
        decision: String,
        hit_policy: String,
        message: String,
    },

    /// An output is outside its clause's allowed values
    #[error("{0}")]
    OutputCheck(String),

    /// Call to a built-in the runtime does not provide
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// An iteration domain has more elements than the interpreter expands
    #[error("Iteration domain exceeds {0} elements")]
    DomainTooLarge(usize),

    /// Constant pool index out of bounds
    #[error("Constant index out of bounds: {0}")]
    ConstantOutOfRange(usize),

    /// Generic runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A program could not be turned into an executable unit
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to compile unit '{unit}': {message}\n{program}")]
pub struct CompilationError {
    pub unit: String,
    pub message: String,
    /// Rendering of the rejected program
    pub program: String,
}
