//! Context functions

use super::{arg, text};
use feel_core::Value;

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let context = arg(args, 0).as_context();
    let value = match name {
        "get value" => context
            .zip(text(arg(args, 1)))
            .and_then(|(context, key)| context.get(key).cloned())
            .unwrap_or_default(),
        "get entries" => context
            .map(|context| {
                Value::List(
                    context
                        .iter()
                        .map(|(key, value)| {
                            Value::context([("key", Value::from(key.as_str())), ("value", value.clone())])
                        })
                        .collect(),
                )
            })
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::call_plain;
    use super::*;

    #[test]
    fn test_context_functions() {
        let ctx = Value::context([("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(call_plain("get value", vec![ctx.clone(), Value::from("b")]), Value::from("x"));
        assert_eq!(call_plain("get value", vec![ctx.clone(), Value::from("z")]), Value::Null);
        let entries = call_plain("get entries", vec![ctx]);
        assert_eq!(entries.as_list().map(<[Value]>::len), Some(2));
        assert_eq!(
            entries.as_list().unwrap()[0].get("key"),
            Some(&Value::from("a"))
        );
    }
}
