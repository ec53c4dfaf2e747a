//! Intermediate Representation (IR)
//!
//! The IR is a typed expression tree produced by the compiler and executed by a
//! compilation service. Each node has fixed semantics; representation choices
//! (native or decimal arithmetic, comparison and equality modes) are made at
//! compile time and recorded on the node.

pub mod decision;
pub mod node;
pub mod program;

pub use decision::{DecisionIr, OutputIr, RuleIr};
pub use node::{Binding, CallTarget, CompareMode, Domain, EqualMode, Ir, NumericMode};
pub use program::{Program, ProgramMetadata};
