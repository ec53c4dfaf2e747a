//! Three-valued logic
//!
//! Non-boolean operands behave like null.

use crate::ast::InfixOp;
use crate::types::Value;

pub fn and(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
        (Some(true), Some(true)) => Value::Boolean(true),
        _ => Value::Null,
    }
}

pub fn or(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
        (Some(false), Some(false)) => Value::Boolean(false),
        _ => Value::Null,
    }
}

pub fn not(value: &Value) -> Value {
    match value.as_bool() {
        Some(b) => Value::Boolean(!b),
        None => Value::Null,
    }
}

/// `and` or `or`
pub fn logic(op: InfixOp, left: &Value, right: &Value) -> Value {
    match op {
        InfixOp::Or => or(left, right),
        _ => and(left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_valued_truth_table() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        let n = Value::Null;
        let rows = [
            (&t, &t, &t, &t),
            (&t, &f, &f, &t),
            (&t, &n, &n, &t),
            (&f, &t, &f, &t),
            (&f, &f, &f, &f),
            (&f, &n, &f, &n),
            (&n, &t, &n, &t),
            (&n, &f, &f, &n),
            (&n, &n, &n, &n),
        ];
        for (a, b, expected_and, expected_or) in rows {
            assert_eq!(&and(a, b), expected_and, "{} and {}", a, b);
            assert_eq!(&or(a, b), expected_or, "{} or {}", a, b);
        }
    }

    #[test]
    fn test_non_boolean_acts_as_null() {
        assert_eq!(and(&Value::Boolean(true), &Value::from(1)), Value::Null);
        assert_eq!(not(&Value::from("x")), Value::Null);
    }
}
