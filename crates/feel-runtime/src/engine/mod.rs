//! IR evaluation
//!
//! `Interpreter` walks an IR tree with one exhaustive match per node. Decision
//! tables, conversions and built-in members live in their own modules.

pub mod convert;
pub mod decision;
pub mod interpreter;

pub use interpreter::{Frame, Interpreter};
