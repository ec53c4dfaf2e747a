//! Parsing of FEEL temporal literals
//!
//! Used for `@"..."` literals and by the `date`, `time`, `date and time` and
//! `duration` conversion functions.

use crate::types::Value;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parse a local time. A trailing `Z` is accepted and ignored.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim().trim_end_matches('Z');
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Parse `YYYY-MM-DDThh:mm:ss`. A bare date means midnight.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    match text.split_once('T') {
        Some((date, time)) => Some(parse_date(date)?.and_time(parse_time(time)?)),
        None => Some(parse_date(text)?.and_time(NaiveTime::MIN)),
    }
}

/// Parse an ISO 8601 duration into a day-time or year-month duration value.
///
/// `P1Y2M` is a years-and-months duration; `P1DT2H3M4.5S` is a days-and-time
/// duration. Mixing both halves is rejected.
pub fn parse_duration(text: &str) -> Option<Value> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) if !t.is_empty() => (d, Some(t)),
        Some(_) => return None,
        None => (rest, None),
    };

    let mut months: i64 = 0;
    let mut days: i64 = 0;
    let mut year_month = false;
    for (amount, unit) in components(date_part)? {
        let whole = amount.parse::<i64>().ok()?;
        match unit {
            'Y' => {
                months = months.checked_add(whole.checked_mul(12)?)?;
                year_month = true;
            }
            'M' => {
                months = months.checked_add(whole)?;
                year_month = true;
            }
            'D' => days = whole,
            _ => return None,
        }
    }

    if year_month {
        if days != 0 || time_part.is_some() {
            return None;
        }
        return Some(Value::YearMonthDuration(if negative { -months } else { months }));
    }

    let mut millis: i64 = days.checked_mul(86_400_000)?;
    if let Some(time_part) = time_part {
        for (amount, unit) in components(time_part)? {
            let scale = match unit {
                'H' => 3_600_000.0,
                'M' => 60_000.0,
                'S' => 1_000.0,
                _ => return None,
            };
            let value = amount.parse::<f64>().ok()?;
            millis = millis.checked_add((value * scale).round() as i64)?;
        }
    }
    let duration = Duration::try_milliseconds(millis)?;
    Some(Value::DayTimeDuration(if negative { -duration } else { duration }))
}

/// Split `1Y2M` into `[("1", 'Y'), ("2", 'M')]`
fn components(text: &str) -> Option<Vec<(&str, char)>> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch.is_ascii_alphabetic() {
            if i == start {
                return None;
            }
            parts.push((&text[start..i], ch));
            start = i + ch.len_utf8();
        }
    }
    if start != text.len() {
        return None;
    }
    Some(parts)
}

/// Parse any temporal literal: duration, date and time, date or time.
pub fn parse_temporal(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.starts_with('P') || trimmed.starts_with("-P") {
        return parse_duration(trimmed);
    }
    if trimmed.contains('T') {
        return parse_date_time(trimmed).map(Value::DateTime);
    }
    if let Some(date) = parse_date(trimmed) {
        return Some(Value::Date(date));
    }
    parse_time(trimmed).map(Value::Time)
}
