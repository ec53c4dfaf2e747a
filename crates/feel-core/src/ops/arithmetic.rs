//! Arithmetic kernels

use crate::ast::InfixOp;
use crate::ir::NumericMode;
use crate::types::number::DECIMAL_PRECISION;
use crate::types::Value;

/// Numeric `+ - * / **`. Null, non-numbers and division by zero give null.
pub fn arith(op: InfixOp, left: &Value, right: &Value, mode: NumericMode) -> Value {
    arith_with_precision(op, left, right, mode, DECIMAL_PRECISION)
}

/// `arith` with division rounded to `precision` significant digits
pub fn arith_with_precision(
    op: InfixOp,
    left: &Value,
    right: &Value,
    mode: NumericMode,
    precision: u64,
) -> Value {
    let result = match (op, left, right) {
        (InfixOp::Div, Value::Number(l), Value::Number(r)) => l.div_with_precision(r, precision),
        (_, Value::Number(l), Value::Number(r)) => l.arith(op, r, mode == NumericMode::Decimal),
        _ => None,
    };
    result.map(Value::Number).unwrap_or(Value::Null)
}

/// Arithmetic negation of numbers and durations
pub fn negate(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(n.neg()),
        Value::DayTimeDuration(d) => Value::DayTimeDuration(-*d),
        Value::YearMonthDuration(m) => Value::YearMonthDuration(-m),
        _ => Value::Null,
    }
}

/// String `+`. The non-string operand is rendered as text.
pub fn concat(left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    Value::String(format!("{}{}", left, right))
}
