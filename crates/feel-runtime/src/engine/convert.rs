//! Runtime conversions and built-in members

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use feel_core::types::NumberKind;
use feel_core::{FType, Value};
use tracing::debug;

/// Convert a value to a type of the lattice; impossible conversions give null.
///
/// Singleton lists unwrap to their element and scalars wrap into a
/// singleton list when the other side asks for it.
pub fn convert(value: Value, target: &FType) -> Value {
    match (value, target) {
        (Value::Null, _) => Value::Null,
        (value, FType::Any) => value,
        (Value::Number(n), FType::Number(kind)) => n
            .convert(*kind)
            .or_else(|| {
                n.convert(NumberKind::Long)
                    .and_then(|long| long.convert(*kind))
            })
            .map(Value::Number)
            .unwrap_or_default(),
        (Value::List(items), FType::List(element)) => Value::List(
            items
                .into_iter()
                .map(|item| convert(item, element))
                .collect(),
        ),
        (Value::List(mut items), target) if items.len() == 1 => convert(items.remove(0), target),
        (value, FType::List(element)) => Value::List(vec![convert(value, element)]),
        (Value::Date(date), FType::DateTime) => Value::DateTime(date.and_time(NaiveTime::MIN)),
        (Value::DateTime(date_time), FType::Date) => Value::Date(date_time.date()),
        (value, target) if target.is_instance(&value) => value,
        (value, target) => {
            debug!(from = value.type_name(), to = %target, "conversion gives null");
            Value::Null
        }
    }
}

/// Field or built-in member of a value. Members of a list map over its elements.
pub fn member(value: &Value, name: &str) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Context(fields) => fields.get(name).cloned().unwrap_or_default(),
        Value::List(items) => match name {
            "size" => count(items.len()),
            "isEmpty" => Value::Boolean(items.is_empty()),
            "isNotEmpty" => Value::Boolean(!items.is_empty()),
            _ => Value::List(items.iter().map(|item| member(item, name)).collect()),
        },
        Value::String(s) => match name {
            "length" => count(s.chars().count()),
            "trim" | "strip" => Value::from(s.trim()),
            "upperCase" => Value::String(s.to_uppercase()),
            "lowerCase" => Value::String(s.to_lowercase()),
            "isBlank" => Value::Boolean(s.trim().is_empty()),
            "isEmpty" => Value::Boolean(s.is_empty()),
            _ => Value::Null,
        },
        Value::Date(date) => date_member(date, name),
        Value::Time(time) => match name {
            "hour" => Value::from(time.hour() as i32),
            "minute" => Value::from(time.minute() as i32),
            "second" => Value::from(time.second() as i32),
            "value" => Value::from(time.num_seconds_from_midnight() as i64),
            _ => Value::Null,
        },
        Value::DateTime(date_time) => match name {
            "date" => Value::Date(date_time.date()),
            "time" => Value::Time(date_time.time()),
            "hour" => Value::from(date_time.hour() as i32),
            "minute" => Value::from(date_time.minute() as i32),
            "second" => Value::from(date_time.second() as i32),
            "epochSecond" | "value" => Value::from(date_time.and_utc().timestamp()),
            _ => date_member(&date_time.date(), name),
        },
        Value::DayTimeDuration(duration) => match name {
            "days" => Value::from(duration.num_days()),
            "hours" => Value::from(duration.num_hours() % 24),
            "minutes" => Value::from(duration.num_minutes() % 60),
            "seconds" => Value::from(duration.num_seconds() % 60),
            "value" => Value::from(duration.num_seconds()),
            _ => Value::Null,
        },
        Value::YearMonthDuration(months) => match name {
            "years" => Value::from(months / 12),
            "months" => Value::from(months % 12),
            "value" => Value::from(*months),
            _ => Value::Null,
        },
        Value::Range(range) => match name {
            "start" => range.start.clone().unwrap_or_default(),
            "end" => range.end.clone().unwrap_or_default(),
            "start included" => Value::Boolean(range.start_inclusive),
            "end included" => Value::Boolean(range.end_inclusive),
            _ => Value::Null,
        },
        Value::Function(function) => match (name, function.ftype()) {
            ("returnType", FType::Function { ret, .. }) => Value::String(ret.to_string()),
            ("parameterTypes", FType::Function { params, .. }) => Value::List(
                params.iter().map(|p| Value::String(p.to_string())).collect(),
            ),
            ("parameterNames", _) => Value::List(
                function
                    .param_names()
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
            _ => Value::Null,
        },
        Value::Boolean(_) | Value::Number(_) => Value::Null,
    }
}

fn date_member(date: &NaiveDate, name: &str) -> Value {
    match name {
        "year" => Value::from(date.year()),
        "month" => Value::from(date.month() as i32),
        "day" | "dayOfMonth" => Value::from(date.day() as i32),
        "dayOfYear" => Value::from(date.ordinal() as i32),
        "weekday" => Value::from(date.weekday().number_from_monday() as i32),
        "isLeapYear" => Value::Boolean(date.leap_year()),
        "lengthOfYear" => Value::from(if date.leap_year() { 366 } else { 365 }),
        "epochDay" | "value" => Value::from(date.num_days_from_ce() as i64 - EPOCH_DAYS_FROM_CE),
        _ => Value::Null,
    }
}

/// `NaiveDate::num_days_from_ce` of 1970-01-01
const EPOCH_DAYS_FROM_CE: i64 = 719_163;

fn count(n: usize) -> Value {
    i32::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(n as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::types::RangeValue;
    use feel_core::Number;

    #[test]
    fn test_number_conversions() {
        assert_eq!(
            convert(Value::from(2), &FType::DOUBLE),
            Value::Number(Number::Double(2.0))
        );
        assert_eq!(convert(Value::from(2.7), &FType::INTEGER), Value::from(2));
        assert_eq!(convert(Value::Null, &FType::INTEGER), Value::Null);
    }

    #[test]
    fn test_singleton_lists() {
        assert_eq!(
            convert(Value::from(1), &FType::list(FType::NUMBER)),
            Value::from(vec![1])
        );
        assert_eq!(convert(Value::from(vec![1]), &FType::INTEGER), Value::from(1));
        assert_eq!(convert(Value::from("x"), &FType::INTEGER), Value::Null);
    }

    #[test]
    fn test_members() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(member(&date, "year"), Value::from(2024));
        assert_eq!(member(&date, "isLeapYear"), Value::Boolean(true));
        assert_eq!(
            member(&Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), "epochDay"),
            Value::from(1i64)
        );
        assert_eq!(member(&Value::from("héllo"), "length"), Value::from(5));

        let people = Value::from(vec![
            Value::context([("name", Value::from("a"))]),
            Value::context([("name", Value::from("b"))]),
        ]);
        assert_eq!(member(&people, "name"), Value::from(vec!["a", "b"]));
        assert_eq!(member(&people, "size"), Value::from(2));

        let range = Value::Range(Box::new(RangeValue::new(
            Some(Value::from(1)),
            None,
            false,
            true,
        )));
        assert_eq!(member(&range, "start"), Value::from(1));
        assert_eq!(member(&range, "start included"), Value::Boolean(false));
    }
}
