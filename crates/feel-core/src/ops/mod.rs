//! Value kernels
//!
//! The operator semantics of FEEL over runtime values. The interpreter
//! evaluates IR with these, and the constant folder uses the same functions so
//! that folded and evaluated results never disagree.

pub mod arithmetic;
pub mod comparison;
pub mod logic;
pub mod temporal;

pub use arithmetic::{arith, arith_with_precision, concat, negate};
pub use comparison::{compare, compare_with_mode, equal, equality};
pub use logic::{and, logic, not, or};
pub use temporal::temporal;

use crate::ast::InfixOp;
use crate::ir::NumericMode;
use crate::types::{Number, Value};

/// Apply an operator chosen from the runtime types of its operands
pub fn dynamic(op: InfixOp, left: &Value, right: &Value) -> Value {
    if op.is_and_or() {
        return logic(op, left, right);
    }
    if op.is_eq_ne() {
        return equality(left, right, op == InfixOp::Ne);
    }
    if op.is_ordering() {
        return compare(op, left, right);
    }
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Value::Null,
        (Value::Number(l), Value::Number(r)) => {
            let exact = matches!(l, Number::Decimal(_)) || matches!(r, Number::Decimal(_));
            let mode = if exact {
                NumericMode::Decimal
            } else {
                NumericMode::Native
            };
            arith(op, left, right, mode)
        }
        (Value::String(_), _) | (_, Value::String(_)) if op == InfixOp::Add => {
            concat(left, right)
        }
        _ => temporal(op, left, right),
    }
}
