//! Runtime values for FEEL expressions
//!
//! `Value` covers every FEEL value: JSON-like scalars and collections plus
//! temporal values, ranges and first-class functions.

use crate::error::CoreError;
use crate::ir::Ir;
use crate::types::{FType, Number, NumberKind};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Runtime value type
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DayTimeDuration(Duration),
    /// Total months
    YearMonthDuration(i64),
    List(Vec<Value>),
    Context(IndexMap<String, Value>),
    Range(Box<RangeValue>),
    Function(FunctionValue),
}

/// A range with optional bounds
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub start_inclusive: bool,
    pub end_inclusive: bool,
}

impl RangeValue {
    pub fn new(
        start: Option<Value>,
        end: Option<Value>,
        start_inclusive: bool,
        end_inclusive: bool,
    ) -> Self {
        Self {
            start,
            end,
            start_inclusive,
            end_inclusive,
        }
    }

    /// Containment test. `None` when the value cannot be ordered against a bound.
    pub fn contains(&self, value: &Value) -> Option<bool> {
        if let Some(start) = &self.start {
            match value.compare(start)? {
                Ordering::Less => return Some(false),
                Ordering::Equal if !self.start_inclusive => return Some(false),
                _ => {}
            }
        }
        if let Some(end) = &self.end {
            match value.compare(end)? {
                Ordering::Greater => return Some(false),
                Ordering::Equal if !self.end_inclusive => return Some(false),
                _ => {}
            }
        }
        Some(true)
    }
}

/// A first-class function value
#[derive(Clone)]
pub enum FunctionValue {
    /// User-defined `function(...) body`
    Closure(Arc<Closure>),
    /// Host function registered by a provider
    Native(Arc<NativeFunction>),
    /// Built-in function referenced by name
    Builtin { name: String, ftype: FType },
}

/// A function definition together with the locals it captured
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Arc<Ir>,
    pub captured: Vec<(String, Value)>,
    pub constants: Arc<[Value]>,
    pub ftype: FType,
}

type NativeFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A host function callable from FEEL
pub struct NativeFunction {
    pub name: String,
    pub ftype: FType,
    call: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, ftype: FType, call: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ftype,
            call: Box::new(call),
        }
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("ftype", &self.ftype)
            .finish()
    }
}

impl FunctionValue {
    /// Declared type of this function
    pub fn ftype(&self) -> &FType {
        match self {
            FunctionValue::Closure(c) => &c.ftype,
            FunctionValue::Native(n) => &n.ftype,
            FunctionValue::Builtin { ftype, .. } => ftype,
        }
    }

    /// Parameter names, when known
    pub fn param_names(&self) -> Vec<String> {
        match self.ftype() {
            FType::Function {
                names: Some(names), ..
            } => names.clone(),
            _ => match self {
                FunctionValue::Closure(c) => c.params.clone(),
                _ => Vec::new(),
            },
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionValue::Closure(c) => write!(f, "Closure({})", c.ftype),
            FunctionValue::Native(n) => write!(f, "Native({}: {})", n.name, n.ftype),
            FunctionValue::Builtin { name, .. } => write!(f, "Builtin({})", name),
        }
    }
}

impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionValue::Closure(a), FunctionValue::Closure(b)) => Arc::ptr_eq(a, b),
            (FunctionValue::Native(a), FunctionValue::Native(b)) => Arc::ptr_eq(a, b),
            (FunctionValue::Builtin { name: a, .. }, FunctionValue::Builtin { name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a context value from name/value pairs
    pub fn context<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Context(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Context(map) => Some(map),
            _ => None,
        }
    }

    /// Context field lookup; `None` for missing fields and non-contexts
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_context().and_then(|map| map.get(name))
    }

    /// Name of this value's type family, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "date and time",
            Value::DayTimeDuration(_) => "days and time duration",
            Value::YearMonthDuration(_) => "years and months duration",
            Value::List(_) => "list",
            Value::Context(_) => "context",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
        }
    }

    /// Semantic ordering between values of the same family.
    ///
    /// `None` when the values are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.compare(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::DateTime(b)) => Some(a.and_time(NaiveTime::MIN).cmp(b)),
            (Value::DateTime(a), Value::Date(b)) => Some(a.cmp(&b.and_time(NaiveTime::MIN))),
            (Value::DayTimeDuration(a), Value::DayTimeDuration(b)) => Some(a.cmp(b)),
            (Value::YearMonthDuration(a), Value::YearMonthDuration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert a JSON value. Integral numbers take the narrowest integer
    /// representation, other numbers become doubles.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(i) => Value::Number(Number::Integer(i)),
                        Err(_) => Value::Number(Number::Long(i)),
                    }
                } else if let Some(number) = Number::parse_literal(&n.to_string())
                    .filter(|_| n.is_u64())
                {
                    Value::Number(number)
                } else {
                    Value::Number(Number::Double(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Context(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert any serializable host value through its JSON form
    pub fn from_serialize<T: Serialize>(value: &T) -> crate::Result<Self> {
        serde_json::to_value(value)
            .map(Value::from_json)
            .map_err(|e| CoreError::InvalidValue(e.to_string()))
    }

    /// Read this value as a host type through its JSON form
    pub fn to_host<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| CoreError::TypeError(format!("cannot read {} as host value: {}", self.type_name(), e)))
    }

    /// Best-effort JSON rendering. Temporal values and functions become strings.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FType {
    /// Type of a runtime value. List elements unify with `min_super`.
    pub fn of_value(value: &Value) -> FType {
        match value {
            Value::Null => FType::Null,
            Value::Boolean(_) => FType::Boolean,
            Value::Number(n) => FType::Number(n.kind()),
            Value::String(_) => FType::String,
            Value::Date(_) => FType::Date,
            Value::Time(_) => FType::Time,
            Value::DateTime(_) => FType::DateTime,
            Value::DayTimeDuration(_) => FType::DayTimeDuration,
            Value::YearMonthDuration(_) => FType::YearMonthDuration,
            Value::List(items) => {
                let element = items
                    .iter()
                    .map(FType::of_value)
                    .reduce(|a, b| a.min_super(&b))
                    .unwrap_or(FType::Any);
                FType::list(element)
            }
            Value::Context(map) => FType::Context(
                map.iter()
                    .map(|(k, v)| (k.clone(), FType::of_value(v)))
                    .collect(),
            ),
            Value::Range(range) => {
                let element = range
                    .start
                    .as_ref()
                    .or(range.end.as_ref())
                    .map(FType::of_value)
                    .unwrap_or(FType::Any);
                FType::Range {
                    element: Box::new(element),
                    start_inclusive: Some(range.start_inclusive),
                    end_inclusive: Some(range.end_inclusive),
                }
            }
            Value::Function(f) => f.ftype().clone(),
        }
    }

    /// Whether a runtime value is an instance of this type
    pub fn is_instance(&self, value: &Value) -> bool {
        match (self, value) {
            (FType::Any, _) => true,
            (FType::Null, Value::Null) => true,
            (_, Value::Null) => false,
            (FType::Number(NumberKind::Number), Value::Number(_)) => true,
            (FType::List(element), Value::List(items)) => {
                items.iter().all(|item| element.is_instance(item))
            }
            (FType::Context(fields), Value::Context(map)) => fields
                .iter()
                .all(|(name, t)| map.get(name).is_some_and(|v| t.is_instance(v))),
            (FType::Range { element, .. }, Value::Range(range)) => range
                .start
                .iter()
                .chain(range.end.iter())
                .all(|v| element.is_instance(v)),
            (FType::Function { .. }, Value::Function(f)) => f.ftype().conforms_to(self),
            (t, v) => FType::of_value(v).conforms_to(t),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::DayTimeDuration(a), Value::DayTimeDuration(b)) => a == b,
            (Value::YearMonthDuration(a), Value::YearMonthDuration(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Context(a), Value::Context(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Long(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Double(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from_json(value)
    }
}

/// ISO 8601 rendering of a days-and-time duration
pub fn format_day_time_duration(duration: &Duration) -> String {
    let negative = *duration < Duration::zero();
    let total = duration.num_milliseconds().unsigned_abs();
    let days = total / 86_400_000;
    let hours = total / 3_600_000 % 24;
    let minutes = total / 60_000 % 60;
    let millis = total % 60_000;

    let mut out = String::from(if negative { "-P" } else { "P" });
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || millis > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if millis > 0 || (hours == 0 && minutes == 0) {
            if millis % 1000 == 0 {
                out.push_str(&format!("{}S", millis / 1000));
            } else {
                out.push_str(&format!("{}.{:03}S", millis / 1000, millis % 1000));
            }
        }
    }
    out
}

/// ISO 8601 rendering of a years-and-months duration
pub fn format_year_month_duration(months: i64) -> String {
    let sign = if months < 0 { "-" } else { "" };
    let abs = months.unsigned_abs();
    match (abs / 12, abs % 12) {
        (0, m) => format!("{}P{}M", sign, m),
        (y, 0) => format!("{}P{}Y", sign, y),
        (y, m) => format!("{}P{}Y{}M", sign, y, m),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::DayTimeDuration(d) => write!(f, "{}", format_day_time_duration(d)),
            Value::YearMonthDuration(m) => write!(f, "{}", format_year_month_duration(*m)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Context(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Range(r) => {
                write!(f, "{}", if r.start_inclusive { "[" } else { "(" })?;
                if let Some(start) = &r.start {
                    write!(f, "{}", start)?;
                }
                write!(f, "..")?;
                if let Some(end) = &r.end {
                    write!(f, "{}", end)?;
                }
                write!(f, "{}", if r.end_inclusive { "]" } else { ")" })
            }
            Value::Function(func) => write!(f, "{}", func.ftype()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i32(*i),
            Value::Number(Number::Long(l)) => serializer.serialize_i64(*l),
            Value::Number(Number::Double(d)) => serializer.serialize_f64(*d),
            Value::Number(Number::Decimal(d)) => serializer.serialize_str(&d.to_string()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Context(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_eq!(Value::from(vec![1, 2]), Value::from(vec![1.0, 2.0]));
    }

    #[test]
    fn test_from_json() {
        let value = Value::from_json(json!({"a": 1, "b": 1.0, "c": [true, null], "d": 3_000_000_000i64}));
        assert!(matches!(value.get("a"), Some(Value::Number(Number::Integer(1)))));
        assert!(matches!(value.get("b"), Some(Value::Number(Number::Double(_)))));
        assert!(matches!(value.get("d"), Some(Value::Number(Number::Long(_)))));
        assert_eq!(
            FType::of_value(&value),
            FType::context([
                ("a", FType::INTEGER),
                ("b", FType::DOUBLE),
                ("c", FType::list(FType::Boolean)),
                ("d", FType::LONG),
            ])
        );
    }

    #[test]
    fn test_range_contains() {
        let range = RangeValue::new(Some(Value::from(1)), Some(Value::from(3)), true, false);
        assert_eq!(range.contains(&Value::from(1)), Some(true));
        assert_eq!(range.contains(&Value::from(3)), Some(false));
        assert_eq!(range.contains(&Value::from("x")), None);
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 11).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-04-11");
        assert_eq!(
            Value::DayTimeDuration(Duration::hours(26)).to_string(),
            "P1DT2H"
        );
        assert_eq!(Value::YearMonthDuration(14).to_string(), "P1Y2M");
        assert_eq!(
            Value::context([("a", Value::from(1)), ("b", Value::from("x"))]).to_string(),
            "{a: 1, b: x}"
        );
    }

    #[test]
    fn test_instance_of() {
        assert!(FType::NUMBER.is_instance(&Value::from(1)));
        assert!(FType::list(FType::NUMBER).is_instance(&Value::from(vec![1, 2])));
        assert!(!FType::String.is_instance(&Value::from(1)));
        assert!(FType::Any.is_instance(&Value::Null));
        assert!(!FType::Date.is_instance(&Value::Null));
    }

    #[test]
    fn test_host_conversions() {
        #[derive(Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Offer {
            decision: String,
            limit: i64,
        }

        let offer = Offer {
            decision: "approve".to_string(),
            limit: 41000,
        };
        let value = Value::from_serialize(&offer).unwrap();
        assert_eq!(value.get("limit"), Some(&Value::from(41000)));
        assert_eq!(value.to_host::<Offer>().unwrap(), offer);

        let err = Value::from("x").to_host::<Offer>().unwrap_err();
        assert!(matches!(err, CoreError::TypeError(_)));
        assert!(err.to_string().contains("cannot read string"));
    }
}
