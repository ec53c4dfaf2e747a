//! List functions

use super::{arg, count, from_f64, int, items, CallContext};
use crate::error::Result;
use feel_core::ast::InfixOp;
use feel_core::ir::NumericMode;
use feel_core::types::FunctionValue;
use feel_core::{ops, Value};
use std::cmp::Ordering;

pub(super) fn call(name: &str, args: &[Value], ctx: &CallContext<'_>) -> Option<Value> {
    let list = arg(args, 0).as_list();
    let value = match name {
        "list contains" => list
            .map(|l| Value::Boolean(l.iter().any(|v| ops::equal(v, arg(args, 1)))))
            .unwrap_or_default(),
        "count" => list.map(|l| count(l.len())).unwrap_or_default(),
        "min" => extreme(items(args), Ordering::Less),
        "max" => extreme(items(args), Ordering::Greater),
        "sum" => fold(items(args), InfixOp::Add),
        "product" => fold(items(args), InfixOp::Mul),
        "mean" => mean(items(args), ctx.precision),
        "median" => median(items(args), ctx.precision),
        "stddev" => stddev(items(args)),
        "mode" => mode(items(args)),
        "all" => all(items(args)),
        "any" => any(items(args)),
        "sublist" => match list {
            Some(l) => sublist(l, arg(args, 1), arg(args, 2)),
            None => Value::Null,
        },
        "append" => match list {
            Some(l) => Value::List(l.iter().chain(&args[1..]).cloned().collect()),
            None => Value::Null,
        },
        "concatenate" => concatenate(args),
        "insert before" => match (list, position(list, arg(args, 1))) {
            (Some(l), Some(at)) => {
                let mut l = l.to_vec();
                l.insert(at, arg(args, 2).clone());
                Value::List(l)
            }
            _ => Value::Null,
        },
        "remove" => match (list, position(list, arg(args, 1))) {
            (Some(l), Some(at)) if at < l.len() => {
                let mut l = l.to_vec();
                l.remove(at);
                Value::List(l)
            }
            _ => Value::Null,
        },
        "reverse" => list
            .map(|l| Value::List(l.iter().rev().cloned().collect()))
            .unwrap_or_default(),
        "index of" => list
            .map(|l| {
                Value::List(
                    l.iter()
                        .enumerate()
                        .filter(|(_, v)| ops::equal(v, arg(args, 1)))
                        .map(|(i, _)| count(i + 1))
                        .collect(),
                )
            })
            .unwrap_or_default(),
        "union" => match concatenate(args) {
            Value::List(all) => Value::List(distinct(all)),
            other => other,
        },
        "distinct values" => list
            .map(|l| Value::List(distinct(l.to_vec())))
            .unwrap_or_default(),
        "flatten" => list
            .map(|l| {
                let mut flat = Vec::new();
                flatten_into(l, &mut flat);
                Value::List(flat)
            })
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// `sort(list, precedes?)`: natural order, or `precedes(a, b)` meaning a comes first
pub(super) fn sort(args: &[Value], ctx: &CallContext<'_>) -> Result<Value> {
    let Some(list) = arg(args, 0).as_list() else {
        return Ok(Value::Null);
    };
    match arg(args, 1) {
        Value::Function(precedes) => {
            let mut sorted: Vec<Value> = Vec::with_capacity(list.len());
            for item in list {
                let mut at = sorted.len();
                for (i, placed) in sorted.iter().enumerate() {
                    if before(precedes, item, placed, ctx)? {
                        at = i;
                        break;
                    }
                }
                sorted.insert(at, item.clone());
            }
            Ok(Value::List(sorted))
        }
        Value::Null => {
            let mut sorted = list.to_vec();
            let mut comparable = true;
            sorted.sort_by(|a, b| {
                a.compare(b).unwrap_or_else(|| {
                    comparable = false;
                    Ordering::Equal
                })
            });
            Ok(if comparable {
                Value::List(sorted)
            } else {
                Value::Null
            })
        }
        _ => Ok(Value::Null),
    }
}

fn before(precedes: &FunctionValue, a: &Value, b: &Value, ctx: &CallContext<'_>) -> Result<bool> {
    Ok((ctx.invoke)(precedes, vec![a.clone(), b.clone()])? == Value::Boolean(true))
}

fn extreme(values: Vec<Value>, wanted: Ordering) -> Value {
    let mut values = values.into_iter();
    let Some(mut best) = values.next() else {
        return Value::Null;
    };
    for value in values {
        match value.compare(&best) {
            Some(ordering) if ordering == wanted => best = value,
            Some(_) => {}
            None => return Value::Null,
        }
    }
    best
}

/// Sum or product; any non-number gives null
fn fold(values: Vec<Value>, op: InfixOp) -> Value {
    if values.iter().any(|v| v.as_number().is_none()) {
        return Value::Null;
    }
    values
        .into_iter()
        .reduce(|acc, v| ops::arith(op, &acc, &v, NumericMode::Native))
        .unwrap_or_default()
}

fn mean(values: Vec<Value>, precision: u64) -> Value {
    let n = values.len();
    match fold(values, InfixOp::Add) {
        Value::Null => Value::Null,
        sum => ops::arith_with_precision(
            InfixOp::Div,
            &sum,
            &count(n),
            NumericMode::Decimal,
            precision,
        ),
    }
}

fn median(values: Vec<Value>, precision: u64) -> Value {
    let Some(sorted) = sorted_numbers(values) else {
        return Value::Null;
    };
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid].clone()
    } else {
        mean(sorted[mid - 1..=mid].to_vec(), precision)
    }
}

/// Sample standard deviation
fn stddev(values: Vec<Value>) -> Value {
    let Some(numbers) = sorted_numbers(values) else {
        return Value::Null;
    };
    if numbers.len() < 2 {
        return Value::Null;
    }
    let xs: Vec<f64> = numbers
        .iter()
        .filter_map(Value::as_number)
        .map(|n| n.to_f64())
        .collect();
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    from_f64(variance.sqrt())
}

/// Most frequent values, ascending
fn mode(values: Vec<Value>) -> Value {
    let Some(sorted) = sorted_numbers(values) else {
        return Value::Null;
    };
    let mut runs: Vec<(Value, usize)> = Vec::new();
    for value in sorted {
        match runs.last_mut() {
            Some((last, n)) if ops::equal(last, &value) => *n += 1,
            _ => runs.push((value, 1)),
        }
    }
    let top = runs.iter().map(|(_, n)| *n).max().unwrap_or(0);
    Value::List(
        runs.into_iter()
            .filter(|(_, n)| *n == top)
            .map(|(v, _)| v)
            .collect(),
    )
}

/// Non-empty numeric list in ascending order
fn sorted_numbers(mut values: Vec<Value>) -> Option<Vec<Value>> {
    if values.is_empty() || values.iter().any(|v| v.as_number().is_none()) {
        return None;
    }
    values.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    Some(values)
}

/// Three-valued conjunction over a list
fn all(values: Vec<Value>) -> Value {
    let mut result = Value::Boolean(true);
    for value in &values {
        if !matches!(value, Value::Boolean(_) | Value::Null) {
            return Value::Null;
        }
        result = ops::and(&result, value);
    }
    result
}

/// Three-valued disjunction over a list
fn any(values: Vec<Value>) -> Value {
    let mut result = Value::Boolean(false);
    for value in &values {
        if !matches!(value, Value::Boolean(_) | Value::Null) {
            return Value::Null;
        }
        result = ops::or(&result, value);
    }
    result
}

fn sublist(list: &[Value], start: &Value, length: &Value) -> Value {
    let Some(start) = int(start) else {
        return Value::Null;
    };
    let len = list.len() as i64;
    let from = match start {
        s if s > 0 => s - 1,
        s if s < 0 => len + s,
        _ => return Value::Null,
    };
    if !(0..len).contains(&from) {
        return Value::Null;
    }
    let to = match length {
        Value::Null => len,
        length => match int(length) {
            Some(n) if n >= 0 => (from + n).min(len),
            _ => return Value::Null,
        },
    };
    Value::List(list[from as usize..to as usize].to_vec())
}

/// 1-based insertion position, negative from the end
fn position(list: Option<&[Value]>, position: &Value) -> Option<usize> {
    let len = list?.len() as i64;
    let at = match int(position)? {
        p if p > 0 => p - 1,
        p if p < 0 => len + p,
        _ => return None,
    };
    (0..=len).contains(&at).then_some(at as usize)
}

fn concatenate(args: &[Value]) -> Value {
    let mut joined = Vec::new();
    for arg in args {
        match arg {
            Value::List(items) => joined.extend(items.iter().cloned()),
            _ => return Value::Null,
        }
    }
    Value::List(joined)
}

fn distinct(values: Vec<Value>) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !seen.iter().any(|v| ops::equal(v, &value)) {
            seen.push(value);
        }
    }
    seen
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(nested) => flatten_into(nested, out),
            other => out.push(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::call_plain;
    use super::super::CallContext;
    use super::*;
    use feel_core::types::NativeFunction;
    use feel_core::{FType, Number};
    use std::sync::Arc;

    fn list(values: &[i32]) -> Value {
        Value::from(values.to_vec())
    }

    fn decimal(text: &str) -> Value {
        Value::Number(Number::parse_literal(text).unwrap())
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(call_plain("sum", vec![list(&[1, 2, 3])]), Value::from(6));
        assert_eq!(
            call_plain("sum", vec![Value::from(1), Value::from(2)]),
            Value::from(3)
        );
        assert_eq!(call_plain("sum", vec![list(&[])]), Value::Null);
        assert_eq!(call_plain("mean", vec![list(&[1, 2, 3, 4])]), decimal("2.5"));
        assert_eq!(call_plain("median", vec![list(&[8, 2, 5, 3, 4])]), Value::from(4));
        assert_eq!(call_plain("median", vec![list(&[6, 1, 2, 3])]), decimal("2.5"));
        assert_eq!(call_plain("mode", vec![list(&[6, 3, 9, 6, 6])]), list(&[6]));
        assert_eq!(call_plain("max", vec![list(&[1, 7, 3])]), Value::from(7));
        assert_eq!(call_plain("product", vec![list(&[2, 3, 4])]), Value::from(24));
    }

    #[test]
    fn test_stddev() {
        let result = call_plain("stddev", vec![list(&[2, 4, 7, 5])]);
        let value = result.as_number().unwrap().to_f64();
        assert!((value - 2.0816659994661326).abs() < 1e-9);
    }

    #[test]
    fn test_boolean_aggregates() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(call_plain("all", vec![Value::List(vec![t.clone(), f.clone()])]), f);
        assert_eq!(call_plain("all", vec![Value::List(vec![])]), t);
        assert_eq!(
            call_plain("all", vec![Value::List(vec![t.clone(), Value::Null])]),
            Value::Null
        );
        assert_eq!(call_plain("any", vec![Value::List(vec![f.clone(), t.clone()])]), t);
        assert_eq!(call_plain("any", vec![Value::List(vec![])]), f);
    }

    #[test]
    fn test_list_editing() {
        assert_eq!(
            call_plain("sublist", vec![list(&[4, 5, 6]), Value::from(1), Value::from(2)]),
            list(&[4, 5])
        );
        assert_eq!(
            call_plain("append", vec![list(&[1]), Value::from(2), Value::from(3)]),
            list(&[1, 2, 3])
        );
        assert_eq!(
            call_plain("concatenate", vec![list(&[1, 2]), list(&[3])]),
            list(&[1, 2, 3])
        );
        assert_eq!(
            call_plain("insert before", vec![list(&[1, 3]), Value::from(1), Value::from(2)]),
            list(&[2, 1, 3])
        );
        assert_eq!(
            call_plain("remove", vec![list(&[1, 2, 3]), Value::from(2)]),
            list(&[1, 3])
        );
        assert_eq!(
            call_plain("index of", vec![list(&[1, 2, 3, 2]), Value::from(2)]),
            list(&[2, 4])
        );
        assert_eq!(
            call_plain("union", vec![list(&[1, 2]), list(&[2, 3])]),
            list(&[1, 2, 3])
        );
        assert_eq!(
            call_plain(
                "flatten",
                vec![Value::List(vec![list(&[1, 2]), Value::List(vec![list(&[3])]), Value::from(4)])]
            ),
            list(&[1, 2, 3, 4])
        );
    }

    #[test]
    fn test_sort_with_precedes() {
        let descending = FunctionValue::Native(Arc::new(NativeFunction::new(
            "descending",
            FType::anonymous_function(vec![FType::Any, FType::Any], FType::Boolean),
            |args| ops::compare(InfixOp::Gt, &args[0], &args[1]),
        )));
        let invoke = |f: &FunctionValue, args: Vec<Value>| match f {
            FunctionValue::Native(native) => Ok(native.call(&args)),
            _ => Ok(Value::Null),
        };
        let ctx = CallContext {
            precision: 34,
            invoke: &invoke,
        };
        let sorted = sort(&[list(&[3, 1, 2]), Value::Function(descending)], &ctx).unwrap();
        assert_eq!(sorted, list(&[3, 2, 1]));
        assert_eq!(call_plain("sort", vec![list(&[3, 1, 2])]), list(&[1, 2, 3]));
    }
}
