//! Built-in function library
//!
//! Calls arrive with positional arguments; named calls were reordered by the
//! compiler or by `Interpreter::invoke`. Missing and ill-typed arguments give
//! null, following FEEL semantics.

mod context;
mod conversion;
mod list;
mod numeric;
mod range;
mod string;
mod temporal;

use crate::error::{Result, RuntimeError};
use bigdecimal::BigDecimal;
use feel_core::types::FunctionValue;
use feel_core::{ops, Number, Value};

/// Every built-in the runtime provides
pub const NAMES: &[&str] = &[
    // conversion
    "date",
    "time",
    "date and time",
    "number",
    "string",
    "duration",
    "years and months duration",
    // boolean
    "not",
    "is",
    // string
    "substring",
    "string length",
    "upper case",
    "lower case",
    "substring before",
    "substring after",
    "replace",
    "contains",
    "starts with",
    "ends with",
    "matches",
    "split",
    // list
    "list contains",
    "count",
    "min",
    "max",
    "sum",
    "mean",
    "all",
    "any",
    "sublist",
    "append",
    "concatenate",
    "insert before",
    "remove",
    "reverse",
    "index of",
    "union",
    "distinct values",
    "flatten",
    "product",
    "median",
    "stddev",
    "mode",
    "sort",
    // numeric
    "decimal",
    "floor",
    "ceiling",
    "abs",
    "modulo",
    "sqrt",
    "log",
    "exp",
    "odd",
    "even",
    // range
    "before",
    "after",
    "meets",
    "met by",
    "overlaps",
    "finishes",
    "finished by",
    "starts",
    "started by",
    "coincides",
    // temporal
    "day of year",
    "day of week",
    "month of year",
    "week of year",
    // context
    "get value",
    "get entries",
];

/// Callback into the interpreter, for functions taking function arguments
pub type Invoke<'a> = dyn Fn(&FunctionValue, Vec<Value>) -> Result<Value> + 'a;

/// What a built-in may need from its caller
pub struct CallContext<'a> {
    /// Significant digits of decimal division
    pub precision: u64,
    pub invoke: &'a Invoke<'a>,
}

/// Whether the runtime provides a built-in
pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Call a built-in by name
pub fn call(name: &str, args: Vec<Value>, ctx: &CallContext<'_>) -> Result<Value> {
    let value = match name {
        "not" => ops::not(arg(&args, 0)),
        "is" => {
            let (a, b) = (arg(&args, 0), arg(&args, 1));
            Value::Boolean(a.type_name() == b.type_name() && ops::equal(a, b))
        }
        "sort" => return list::sort(&args, ctx),
        _ => conversion::call(name, &args)
            .or_else(|| string::call(name, &args))
            .or_else(|| list::call(name, &args, ctx))
            .or_else(|| numeric::call(name, &args))
            .or_else(|| range::call(name, &args))
            .or_else(|| temporal::call(name, &args))
            .or_else(|| context::call(name, &args))
            .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))?,
    };
    Ok(value)
}

static NULL: Value = Value::Null;

/// Argument `i`, null when missing
fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&NULL)
}

fn text(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Integral argument
fn int(value: &Value) -> Option<i64> {
    value.as_number().and_then(Number::to_i64)
}

fn decimal(value: &Value) -> Option<BigDecimal> {
    value.as_number().map(Number::to_decimal)
}

fn from_decimal(value: BigDecimal) -> Value {
    Value::Number(Number::Decimal(value.normalized()))
}

fn from_f64(value: f64) -> Value {
    if value.is_finite() {
        Value::Number(Number::Double(value))
    } else {
        Value::Null
    }
}

/// Arguments of a variadic list function: one list, or the arguments themselves
fn items(args: &[Value]) -> Vec<Value> {
    match args {
        [Value::List(items)] => items.clone(),
        _ => args.to_vec(),
    }
}

/// Length as a FEEL integer
fn count(n: usize) -> Value {
    i32::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(n as i64))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Call a built-in with no function callbacks
    pub fn call_plain(name: &str, args: Vec<Value>) -> Value {
        let invoke = |_: &FunctionValue, _: Vec<Value>| Ok(Value::Null);
        let ctx = CallContext {
            precision: feel_core::types::number::DECIMAL_PRECISION,
            invoke: &invoke,
        };
        call(name, args, &ctx).unwrap()
    }
}
