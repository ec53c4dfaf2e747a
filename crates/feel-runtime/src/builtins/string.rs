//! String functions

use super::{arg, count, int, text};
use feel_core::Value;
use regex::{Regex, RegexBuilder};
use tracing::debug;

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let s = text(arg(args, 0));
    let other = text(arg(args, 1));
    let value = match name {
        "substring" => substring(args),
        "string length" => s.map(|s| count(s.chars().count())).unwrap_or_default(),
        "upper case" => s.map(|s| Value::String(s.to_uppercase())).unwrap_or_default(),
        "lower case" => s.map(|s| Value::String(s.to_lowercase())).unwrap_or_default(),
        "substring before" => match (s, other) {
            (Some(s), Some(m)) => Value::from(s.find(m).map(|i| &s[..i]).unwrap_or("")),
            _ => Value::Null,
        },
        "substring after" => match (s, other) {
            (Some(s), Some(m)) => Value::from(s.find(m).map(|i| &s[i + m.len()..]).unwrap_or("")),
            _ => Value::Null,
        },
        "contains" => both(s, other, |s, m| s.contains(m)),
        "starts with" => both(s, other, |s, m| s.starts_with(m)),
        "ends with" => both(s, other, |s, m| s.ends_with(m)),
        "matches" => match (s, pattern(args, 1, 2)) {
            (Some(s), Some(re)) => Value::Boolean(re.is_match(s)),
            _ => Value::Null,
        },
        "replace" => match (s, pattern(args, 1, 3), text(arg(args, 2))) {
            (Some(s), Some(re), Some(replacement)) => {
                Value::String(re.replace_all(s, replacement).into_owned())
            }
            _ => Value::Null,
        },
        "split" => match (s, pattern(args, 1, usize::MAX)) {
            (Some(s), Some(re)) => Value::List(re.split(s).map(Value::from).collect()),
            _ => Value::Null,
        },
        _ => return None,
    };
    Some(value)
}

fn both(s: Option<&str>, other: Option<&str>, f: impl Fn(&str, &str) -> bool) -> Value {
    match (s, other) {
        (Some(s), Some(m)) => Value::Boolean(f(s, m)),
        _ => Value::Null,
    }
}

/// `substring(string, start position, length?)`, 1-based, negative from the end
fn substring(args: &[Value]) -> Value {
    let (Some(s), Some(start)) = (text(arg(args, 0)), int(arg(args, 1))) else {
        return Value::Null;
    };
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let from = match start {
        p if p > 0 => p - 1,
        p if p < 0 => (len + p).max(0),
        _ => return Value::Null,
    };
    let to = match arg(args, 2) {
        Value::Null => len,
        length => match int(length) {
            Some(length) if length >= 0 => (from + length).min(len),
            _ => return Value::Null,
        },
    };
    if from >= len {
        return Value::from("");
    }
    Value::String(chars[from as usize..to as usize].iter().collect())
}

/// Regex from argument `at` with optional flags from argument `flags_at`
fn pattern(args: &[Value], at: usize, flags_at: usize) -> Option<Regex> {
    let source = text(arg(args, at))?;
    let mut builder = RegexBuilder::new(source);
    if let Some(flags) = text(arg(args, flags_at)) {
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                's' => builder.dot_matches_new_line(true),
                'm' => builder.multi_line(true),
                'x' => builder.ignore_whitespace(true),
                _ => return None,
            };
        }
    }
    builder
        .build()
        .map_err(|err| debug!(pattern = source, error = %err, "invalid pattern"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::call_plain;
    use feel_core::Value;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_substring() {
        assert_eq!(call_plain("substring", vec![s("foobar"), Value::from(3)]), s("obar"));
        assert_eq!(
            call_plain("substring", vec![s("foobar"), Value::from(3), Value::from(3)]),
            s("oba")
        );
        assert_eq!(
            call_plain("substring", vec![s("foobar"), Value::from(-2), Value::from(1)]),
            s("a")
        );
        assert_eq!(call_plain("substring", vec![s("foobar"), Value::from(0)]), Value::Null);
    }

    #[test]
    fn test_search_functions() {
        assert_eq!(call_plain("substring before", vec![s("foobar"), s("bar")]), s("foo"));
        assert_eq!(call_plain("substring after", vec![s("foobar"), s("ob")]), s("ar"));
        assert_eq!(call_plain("substring after", vec![s("foobar"), s("x")]), s(""));
        assert_eq!(call_plain("contains", vec![s("foobar"), s("of")]), Value::Boolean(false));
        assert_eq!(call_plain("starts with", vec![s("foobar"), s("fo")]), Value::Boolean(true));
        assert_eq!(call_plain("string length", vec![s("foo")]), Value::from(3));
        assert_eq!(call_plain("upper case", vec![s("aBc4")]), s("ABC4"));
    }

    #[test]
    fn test_regex_functions() {
        assert_eq!(
            call_plain("matches", vec![s("Foobar"), s("^fo*b"), s("i")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_plain("replace", vec![s("abcd"), s("(ab)|(a)"), s("[1=$1][2=$2]")]),
            s("[1=ab][2=]cd")
        );
        assert_eq!(
            call_plain("split", vec![s("John Doe"), s("\\s")]),
            Value::from(vec!["John", "Doe"])
        );
        assert_eq!(call_plain("matches", vec![s("a"), s("(")]), Value::Null);
    }
}
