//! Conversion functions

use super::{arg, int, text};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use feel_core::types::temporal::{parse_date, parse_date_time, parse_duration, parse_time};
use feel_core::{Number, Value};

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let value = match name {
        "date" => date(args),
        "time" => time(args),
        "date and time" => date_time(args),
        "number" => number(args),
        "string" => match arg(args, 0) {
            Value::Null => Value::Null,
            other => Value::String(other.to_string()),
        },
        "duration" => text(arg(args, 0))
            .and_then(parse_duration)
            .unwrap_or_default(),
        "years and months duration" => years_and_months(arg(args, 0), arg(args, 1)),
        _ => return None,
    };
    Some(value)
}

fn date(args: &[Value]) -> Value {
    let date = match args {
        [Value::String(s)] => parse_date(s).or_else(|| parse_date_time(s).map(|dt| dt.date())),
        [Value::Date(d)] => Some(*d),
        [Value::DateTime(dt)] => Some(dt.date()),
        [year, month, day] => (|| -> Option<NaiveDate> {
            let year = i32::try_from(int(year)?).ok()?;
            let month = u32::try_from(int(month)?).ok()?;
            let day = u32::try_from(int(day)?).ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })(),
        _ => None,
    };
    date.map(Value::Date).unwrap_or_default()
}

fn time(args: &[Value]) -> Value {
    let time = match args {
        [Value::String(s)] => parse_time(s),
        [Value::Time(t)] => Some(*t),
        [Value::DateTime(dt)] => Some(dt.time()),
        [hour, minute, second] => (|| -> Option<NaiveTime> {
            let hour = u32::try_from(int(hour)?).ok()?;
            let minute = u32::try_from(int(minute)?).ok()?;
            let seconds = second.as_number()?.to_f64();
            if seconds < 0.0 {
                return None;
            }
            let millis = (seconds.fract() * 1000.0).round() as u32;
            NaiveTime::from_hms_milli_opt(hour, minute, seconds.trunc() as u32, millis)
        })(),
        _ => None,
    };
    time.map(Value::Time).unwrap_or_default()
}

fn date_time(args: &[Value]) -> Value {
    let date_time = match args {
        [Value::String(s)] => parse_date_time(s),
        [Value::DateTime(dt)] => Some(*dt),
        [Value::Date(d)] => Some(d.and_time(NaiveTime::MIN)),
        [Value::Date(d), Value::Time(t)] => Some(d.and_time(*t)),
        [Value::DateTime(dt), Value::Time(t)] => Some(dt.date().and_time(*t)),
        _ => None,
    };
    date_time.map(Value::DateTime).unwrap_or_default()
}

/// `number(from, grouping separator, decimal separator)`
fn number(args: &[Value]) -> Value {
    let Some(from) = text(arg(args, 0)) else {
        return Value::Null;
    };
    let mut normalized = from.trim().to_string();
    if let Some(grouping) = text(arg(args, 1)) {
        if !matches!(grouping, " " | "," | ".") {
            return Value::Null;
        }
        normalized = normalized.replace(grouping, "");
    }
    if let Some(separator) = text(arg(args, 2)) {
        if !matches!(separator, "," | ".") {
            return Value::Null;
        }
        normalized = normalized.replace(separator, ".");
    }
    Number::parse_literal(&normalized)
        .map(Value::Number)
        .unwrap_or_default()
}

/// Whole months between two dates, truncated toward zero
fn years_and_months(from: &Value, to: &Value) -> Value {
    let (Some(from), Some(to)) = (as_date_time(from), as_date_time(to)) else {
        return Value::Null;
    };
    let mut months = (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64;
    let day_earlier = (to.day(), to.time()) < (from.day(), from.time());
    let day_later = (to.day(), to.time()) > (from.day(), from.time());
    if months > 0 && day_earlier {
        months -= 1;
    } else if months < 0 && day_later {
        months += 1;
    }
    Value::YearMonthDuration(months)
}

fn as_date_time(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        Value::DateTime(dt) => Some(*dt),
        _ => None,
    }
}
