//! Calendar functions over dates and date-times

use super::{arg, count};
use chrono::Datelike;
use feel_core::Value;

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let date = match arg(args, 0) {
        Value::Date(date) => Some(*date),
        Value::DateTime(date_time) => Some(date_time.date()),
        _ => None,
    };
    let value = match name {
        "day of year" => date.map(|d| count(d.ordinal() as usize)),
        "day of week" => date.map(|d| Value::from(DAYS[d.weekday().num_days_from_monday() as usize])),
        "month of year" => date.map(|d| Value::from(MONTHS[d.month0() as usize])),
        "week of year" => date.map(|d| count(d.iso_week().week() as usize)),
        _ => return None,
    };
    Some(value.unwrap_or_default())
}
