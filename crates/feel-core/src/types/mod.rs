//! FEEL type system
//!
//! This module contains:
//! - The semantic type lattice (`FType`)
//! - Number representations and their arithmetic
//! - Runtime values
//! - Host type reflection

pub mod ftype;
pub mod number;
pub mod temporal;
pub mod typed;
pub mod value;

pub use ftype::{CompatRank, FType, NumberKind};
pub use number::Number;
pub use typed::FeelTyped;
pub use value::{Closure, FunctionValue, NativeFunction, RangeValue, Value};
