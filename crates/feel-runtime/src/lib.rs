//! FEEL Runtime - Execution of compiled FEEL programs
//!
//! This crate loads IR programs through a `CompilationService` and exposes
//! them as `Expression`, `UnaryTest` and `DecisionTable` capabilities. The
//! default service interprets the IR directly; the built-in function library
//! lives in `builtins`.

pub mod builtins;
pub mod capability;
pub mod engine;
pub mod error;
pub mod result;
pub mod service;

// Re-export main types
pub use capability::{DecisionTable, Expression, UnaryTest};
pub use engine::{Frame, Interpreter};
pub use error::{CompilationError, Result, RuntimeError};
pub use result::EvalResult;
pub use service::{
    CompilationService, Executable, ExecutableUnit, InterpretedProgram, InterpreterService,
};
