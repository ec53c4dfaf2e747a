//! Ordering and equality kernels

use crate::ast::InfixOp;
use crate::ir::CompareMode;
use crate::types::Value;
use std::cmp::Ordering;

/// `< <= > >=` (and `= !=` by ordering). Null or incomparable operands give null.
pub fn compare(op: InfixOp, left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    match left.compare(right) {
        Some(ordering) => Value::Boolean(holds(op, ordering)),
        None => Value::Null,
    }
}

/// Comparison honoring a static comparison mode
pub fn compare_with_mode(op: InfixOp, mode: CompareMode, left: &Value, right: &Value) -> Value {
    match (mode, left, right) {
        (CompareMode::Double, Value::Number(l), Value::Number(r)) => {
            match l.to_f64().partial_cmp(&r.to_f64()) {
                Some(ordering) => Value::Boolean(holds(op, ordering)),
                None => Value::Null,
            }
        }
        _ => compare(op, left, right),
    }
}

fn holds(op: InfixOp, ordering: Ordering) -> bool {
    match op {
        InfixOp::Lt => ordering.is_lt(),
        InfixOp::Le => ordering.is_le(),
        InfixOp::Gt => ordering.is_gt(),
        InfixOp::Ge => ordering.is_ge(),
        InfixOp::Ne => ordering.is_ne(),
        _ => ordering.is_eq(),
    }
}

/// Null-safe FEEL equality. Numbers compare by value, so `1 = 1.0`.
pub fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Date(_) | Value::DateTime(_), Value::Date(_) | Value::DateTime(_)) => {
            left.compare(right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}

/// `=` or, when `negated`, `!=`
pub fn equality(left: &Value, right: &Value, negated: bool) -> Value {
    Value::Boolean(equal(left, right) != negated)
}
