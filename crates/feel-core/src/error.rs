//! Error types for FEEL Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A decision table definition violates a structural invariant
    #[error("Invalid decision table definition: {0}")]
    Definition(#[from] crate::dmn::DefinitionError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
