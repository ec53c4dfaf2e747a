//! Date, time and duration arithmetic

use crate::ast::InfixOp;
use crate::types::{Number, Value};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Temporal `+ - * /`. Unsupported combinations and overflow give null.
pub fn temporal(op: InfixOp, left: &Value, right: &Value) -> Value {
    use Value::*;
    let result = match (op, left, right) {
        // Differences
        (InfixOp::Sub, Date(_) | DateTime(_), Date(_) | DateTime(_)) => {
            match (instant(left), instant(right)) {
                (Some(a), Some(b)) => Some(DayTimeDuration(a - b)),
                _ => None,
            }
        }
        (InfixOp::Sub, Time(a), Time(b)) => Some(DayTimeDuration(a.signed_duration_since(*b))),

        // Shifting by a days-and-time duration
        (InfixOp::Add | InfixOp::Sub, Date(d), DayTimeDuration(delta)) => {
            shift_date_time(op, d.and_time(NaiveTime::MIN), *delta).map(|dt| Date(dt.date()))
        }
        (InfixOp::Add | InfixOp::Sub, DateTime(dt), DayTimeDuration(delta)) => {
            shift_date_time(op, *dt, *delta).map(DateTime)
        }
        (InfixOp::Add | InfixOp::Sub, Time(t), DayTimeDuration(delta)) => {
            let delta = signed(op, *delta);
            Some(Time(t.overflowing_add_signed(delta).0))
        }
        (InfixOp::Add, DayTimeDuration(_), Date(_) | DateTime(_) | Time(_)) => {
            return temporal(op, right, left);
        }

        // Shifting by a years-and-months duration
        (InfixOp::Add | InfixOp::Sub, Date(d), YearMonthDuration(months)) => {
            shift_months(*d, signed_months(op, *months)).map(Date)
        }
        (InfixOp::Add | InfixOp::Sub, DateTime(dt), YearMonthDuration(months)) => {
            shift_months(dt.date(), signed_months(op, *months)).map(|d| DateTime(d.and_time(dt.time())))
        }
        (InfixOp::Add, YearMonthDuration(_), Date(_) | DateTime(_)) => {
            return temporal(op, right, left);
        }

        // Duration arithmetic
        (InfixOp::Add, DayTimeDuration(a), DayTimeDuration(b)) => a.checked_add(b).map(DayTimeDuration),
        (InfixOp::Sub, DayTimeDuration(a), DayTimeDuration(b)) => a.checked_sub(b).map(DayTimeDuration),
        (InfixOp::Add, YearMonthDuration(a), YearMonthDuration(b)) => {
            a.checked_add(*b).map(YearMonthDuration)
        }
        (InfixOp::Sub, YearMonthDuration(a), YearMonthDuration(b)) => {
            a.checked_sub(*b).map(YearMonthDuration)
        }
        (InfixOp::Mul | InfixOp::Div, DayTimeDuration(d), Value::Number(n)) => {
            scale(op, d.num_milliseconds(), n).and_then(Duration::try_milliseconds).map(DayTimeDuration)
        }
        (InfixOp::Mul | InfixOp::Div, YearMonthDuration(m), Value::Number(n)) => {
            scale(op, *m, n).map(YearMonthDuration)
        }
        (InfixOp::Mul, Value::Number(_), DayTimeDuration(_) | YearMonthDuration(_)) => {
            return temporal(op, right, left);
        }
        (InfixOp::Div, DayTimeDuration(a), DayTimeDuration(b)) => {
            ratio(a.num_milliseconds(), b.num_milliseconds())
        }
        (InfixOp::Div, YearMonthDuration(a), YearMonthDuration(b)) => ratio(*a, *b),
        _ => None,
    };
    result.unwrap_or(Value::Null)
}

fn instant(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        Value::DateTime(dt) => Some(*dt),
        _ => None,
    }
}

fn signed(op: InfixOp, delta: Duration) -> Duration {
    if op == InfixOp::Sub {
        -delta
    } else {
        delta
    }
}

fn signed_months(op: InfixOp, months: i64) -> i64 {
    if op == InfixOp::Sub {
        -months
    } else {
        months
    }
}

fn shift_date_time(op: InfixOp, base: NaiveDateTime, delta: Duration) -> Option<NaiveDateTime> {
    base.checked_add_signed(signed(op, delta))
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        date.checked_sub_months(magnitude)
    } else {
        date.checked_add_months(magnitude)
    }
}

/// Scale an integral amount by a number, truncating toward zero
fn scale(op: InfixOp, amount: i64, factor: &Number) -> Option<i64> {
    let factor = factor.to_f64();
    let scaled = match op {
        InfixOp::Div if factor == 0.0 => return None,
        InfixOp::Div => amount as f64 / factor,
        _ => amount as f64 * factor,
    };
    scaled.is_finite().then(|| scaled.trunc() as i64)
}

fn ratio(a: i64, b: i64) -> Option<Value> {
    Number::Long(a).div(&Number::Long(b)).map(Value::Number)
}
