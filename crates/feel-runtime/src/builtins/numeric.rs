//! Numeric functions

use super::{arg, decimal, from_decimal, from_f64, int};
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::Duration;
use feel_core::{Number, Value};

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let value = match name {
        "decimal" => round(args, RoundingMode::HalfEven, false),
        "floor" => round(args, RoundingMode::Floor, true),
        "ceiling" => round(args, RoundingMode::Ceiling, true),
        "abs" => match arg(args, 0) {
            Value::Number(n) => Value::Number(match n {
                Number::Integer(i) => i
                    .checked_abs()
                    .map(Number::Integer)
                    .unwrap_or_else(|| Number::Long((*i as i64).abs())),
                Number::Long(l) => l
                    .checked_abs()
                    .map(Number::Long)
                    .unwrap_or_else(|| Number::Decimal(BigDecimal::from(*l).abs())),
                Number::Double(d) => Number::Double(d.abs()),
                Number::Decimal(d) => Number::Decimal(d.abs()),
            }),
            Value::DayTimeDuration(d) if *d < Duration::zero() => Value::DayTimeDuration(-*d),
            Value::DayTimeDuration(d) => Value::DayTimeDuration(*d),
            Value::YearMonthDuration(m) => Value::YearMonthDuration(m.abs()),
            _ => Value::Null,
        },
        "modulo" => match (decimal(arg(args, 0)), decimal(arg(args, 1))) {
            (Some(dividend), Some(divisor)) if !divisor.is_zero() => {
                let zero = BigDecimal::zero();
                let mut remainder = &dividend % &divisor;
                if !remainder.is_zero() && (remainder < zero) != (divisor < zero) {
                    remainder += divisor;
                }
                from_decimal(remainder)
            }
            _ => Value::Null,
        },
        "sqrt" => match decimal(arg(args, 0)) {
            Some(n) if n >= BigDecimal::zero() => n.sqrt().map(from_decimal).unwrap_or_default(),
            _ => Value::Null,
        },
        "log" => match arg(args, 0).as_number().map(Number::to_f64) {
            Some(n) if n > 0.0 => from_f64(n.ln()),
            _ => Value::Null,
        },
        "exp" => match arg(args, 0).as_number() {
            Some(n) => from_f64(n.to_f64().exp()),
            None => Value::Null,
        },
        "odd" => match int(arg(args, 0)) {
            Some(n) => Value::Boolean(n % 2 != 0),
            None => Value::Null,
        },
        "even" => match int(arg(args, 0)) {
            Some(n) => Value::Boolean(n % 2 == 0),
            None => Value::Null,
        },
        _ => return None,
    };
    Some(value)
}

/// `decimal(n, scale)` needs the scale; `floor` and `ceiling` default it to 0
fn round(args: &[Value], mode: RoundingMode, scale_optional: bool) -> Value {
    let Some(n) = decimal(arg(args, 0)) else {
        return Value::Null;
    };
    let scale = match arg(args, 1) {
        Value::Null if scale_optional => 0,
        scale => match int(scale) {
            Some(s) if (-6111..=6176).contains(&s) => s,
            _ => return Value::Null,
        },
    };
    from_decimal(n.with_scale_round(scale, mode))
}
