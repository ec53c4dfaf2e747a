//! Integration tests for the FeelEngine facade
//!
//! Covers the public compile API, the artifact cache and custom providers.

mod common;

use common::{ab_type, engine, greeting_table, input, number, rule};
use feel_sdk::{
    Aggregation, DecisionTableDefinition, FType, FeelEngineBuilder, FeelError, FeelTyped,
    HitPolicy, InputClause, NativeFunction, NativeFunctionFactory, OutputClause, Value,
};
use serde::Serialize;
use std::sync::Arc;

// ========== Expression Tests ==========

#[test]
fn test_constant_expression() {
    let engine = engine();
    let expression = engine.compile_expression("1+1", FType::Any).unwrap();
    assert_eq!(expression.eval(&Value::Null).get(), Some(&Value::from(2)));
    assert_eq!(expression.result_type(), &FType::INTEGER);
}

#[test]
fn test_expression_over_sample_value() {
    let engine = engine();
    let integer = input([("a", Value::from(1))]);
    let result = engine
        .compile_expression_for_value("a+1", &integer)
        .unwrap()
        .eval(&integer);
    assert_eq!(result.get(), Some(&Value::from(2)));

    let double = input([("a", Value::from(1.0))]);
    let result = engine
        .compile_expression_for_value("a+1", &double)
        .unwrap()
        .eval(&double);
    assert_eq!(result.get().map(ToString::to_string).as_deref(), Some("2.0"));
}

#[test]
fn test_decimal_semantics() {
    let engine = engine();
    assert_eq!(engine.evaluate("0.1 + 0.2", &Value::Null).get(), Some(&number("0.3")));
    assert!(engine.evaluate("null + 1", &Value::Null).is_null());
    assert_eq!(
        engine.evaluate("1 / 3 * 3", &Value::Null).get(),
        Some(&number("0.9999999999999999999999999999999999"))
    );
}

#[test]
fn test_quantifiers() {
    let engine = engine();
    assert_eq!(
        engine
            .evaluate("some _ in [1,2,3,4,5,6] satisfies _ > 3", &Value::Null)
            .as_bool(),
        Some(true)
    );
    assert_eq!(
        engine
            .evaluate("every _ in [1,2,3,4,5,6] satisfies _ > 3", &Value::Null)
            .as_bool(),
        Some(false)
    );
}

#[derive(Serialize)]
struct Applicant {
    name: String,
    age: i32,
}

impl FeelTyped for Applicant {
    fn feel_type() -> FType {
        FType::context([("name", FType::String), ("age", FType::INTEGER)])
    }
}

#[test]
fn test_host_typed_input() -> anyhow::Result<()> {
    let engine = engine();
    let expression =
        engine.compile_expression_for::<Applicant>("if age >= 18 then name + \" (adult)\" else name")?;
    let applicant = Applicant {
        name: "Ada".to_string(),
        age: 36,
    };
    let result = expression.eval(&Value::from_serialize(&applicant)?);
    assert_eq!(result.as_str(), Some("Ada (adult)"));
    assert_eq!(expression.result_type(), &FType::String);
    Ok(())
}

// ========== Unary Test Tests ==========

#[test]
fn test_unary_test() {
    let engine = engine();
    let test = engine
        .compile_unary_test("?>1", FType::INTEGER, FType::Any)
        .unwrap();
    assert!(test.test(&Value::from(2), &Value::Null));
    assert!(!test.test(&Value::from(0), &Value::Null));
}

#[test]
fn test_unary_test_reads_root_input() {
    let engine = engine();
    let limits = input([("limit", Value::from(10))]);
    let test = engine
        .compile_unary_test_for_value("< limit", &Value::from(1), &limits)
        .unwrap();
    assert!(test.test(&Value::from(5), &limits));
    assert!(!test.test(&Value::from(15), &limits));
}

// ========== Decision Table Tests ==========

#[test]
fn test_greeting_table() {
    let engine = engine();
    let table = engine
        .compile_decision_table(&greeting_table(), ab_type())
        .unwrap();

    let first = input([("a", Value::from(1)), ("b", Value::from(2))]);
    assert_eq!(table.evaluate(&first).as_str(), Some("hello world"));

    let second = input([("a", Value::from(1)), ("b", Value::from(1))]);
    assert_eq!(table.evaluate(&second).as_str(), Some("hello world 2"));

    assert_eq!(table.definition(), &greeting_table());
    assert_eq!(table.source(), serde_json::to_string(&greeting_table()).unwrap());
}

#[test]
fn test_unique_overlap_is_an_error_result() {
    let definition = DecisionTableDefinition::builder()
        .name("overlap")
        .input(InputClause::new("x"))
        .output(OutputClause::unnamed())
        .rule(rule(&["> 0"], &["\"positive\""]))
        .rule(rule(&["> 10"], &["\"large\""]))
        .build()
        .unwrap();
    let engine = engine();
    let table = engine
        .compile_decision_table(&definition, FType::context([("x", FType::NUMBER)]))
        .unwrap();

    assert_eq!(
        table.evaluate(&input([("x", Value::from(5))])).as_str(),
        Some("positive")
    );
    let overlap = table.evaluate(&input([("x", Value::from(50))]));
    assert!(!overlap.is_success());
    assert!(overlap.message.unwrap().contains("rules 1, 2 all match"));
}

#[test]
fn test_collect_count_table() {
    let definition = DecisionTableDefinition::builder()
        .name("flags")
        .input(InputClause::new("amount"))
        .input(InputClause::new("country"))
        .output(OutputClause::unnamed())
        .rule(rule(&["> 1000", "-"], &["\"large\""]))
        .rule(rule(&["-", "not(\"US\")"], &["\"foreign\""]))
        .hit_policy(HitPolicy::Collect)
        .aggregation(Aggregation::Count)
        .build()
        .unwrap();
    let engine = engine();
    let sample = input([("amount", Value::from(0)), ("country", Value::from(""))]);
    let table = engine
        .compile_decision_table_for_value(&definition, &sample)
        .unwrap();

    let both = input([("amount", Value::from(5000)), ("country", Value::from("FR"))]);
    assert_eq!(table.evaluate(&both).get(), Some(&Value::from(2)));
    let none = input([("amount", Value::from(5)), ("country", Value::from("US"))]);
    assert_eq!(table.evaluate(&none).get(), Some(&Value::from(0)));
    assert_eq!(table.result_type(), &FType::INTEGER);
}

#[test]
fn test_invalid_definition_is_rejected() {
    let mut definition = greeting_table();
    definition.rules[0].input_entries.pop();
    let err = engine()
        .compile_decision_table(&definition, ab_type())
        .unwrap_err();
    assert!(matches!(err, FeelError::DefinitionError(_)));
}

// ========== Cache Tests ==========

#[test]
fn test_second_compile_is_a_cache_hit() {
    let engine = engine();
    let first = engine.compile_expression("a + 1", ab_type()).unwrap();
    let second = engine.compile_expression("a  +  1", ab_type()).unwrap();
    assert_eq!(engine.compilations(), 1);
    assert_eq!(first.program(), second.program());

    engine.compile_decision_table(&greeting_table(), ab_type()).unwrap();
    engine.compile_decision_table(&greeting_table(), ab_type()).unwrap();
    assert_eq!(engine.compilations(), 2);

    engine.clear_cache();
    engine.compile_expression("a + 1", ab_type()).unwrap();
    assert_eq!(engine.compilations(), 3);
}

#[test]
fn test_failed_compiles_are_retried() {
    let engine = engine();
    assert!(engine.compile_expression("1 +", FType::Any).is_err());
    assert!(engine.compile_expression("1 +", FType::Any).is_err());
    assert_eq!(engine.compilations(), 2);
    assert_eq!(engine.cached(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_compiles_share_one_artifact() {
    let engine = Arc::new(engine());
    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let expression = engine
                .compile_expression("a * 2 + b", ab_type())
                .expect("compiles");
            let sample = input([("a", Value::from(i)), ("b", Value::from(1))]);
            expression.eval(&sample).get().cloned()
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let value = handle.await.unwrap();
        assert_eq!(value, Some(Value::from(i as i32 * 2 + 1)));
    }
    assert_eq!(engine.compilations(), 1);
    assert_eq!(engine.cached(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unrelated_keys_compile_independently() {
    let engine = Arc::new(engine());
    let sources = ["1 + 1", "2 * 3", "\"a\" + \"b\"", "[1, 2, 3]"];
    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let engine = engine.clone();
            let source = source.to_string();
            tokio::task::spawn_blocking(move || engine.compile_expression(&source, FType::Any).is_ok())
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(engine.compilations(), sources.len() as u64);
}

// ========== Extension Tests ==========

#[test]
fn test_custom_function_provider() {
    let discount = NativeFunction::new(
        "discount",
        FType::function(vec![("price", FType::NUMBER)], FType::NUMBER),
        |args| match args.first().and_then(Value::as_number) {
            Some(price) => Value::from(price.to_f64() * 0.9),
            None => Value::Null,
        },
    );
    let engine = FeelEngineBuilder::new()
        .with_function_factory(Arc::new(NativeFunctionFactory::new().with(discount)))
        .build()
        .unwrap();

    let result = engine.evaluate("discount(100)", &Value::Null);
    assert_eq!(result.get(), Some(&Value::from(90.0)));
    // Defaults remain available behind custom providers
    assert_eq!(engine.evaluate("abs(-1)", &Value::Null).get(), Some(&Value::from(1)));
}

#[test]
fn test_non_strict_names() {
    let engine = FeelEngineBuilder::new().strict_names(false).build().unwrap();
    let result = engine
        .compile_expression("missing + 1", FType::Any)
        .unwrap()
        .eval(&input([("missing", Value::from(1))]));
    assert_eq!(result.get(), Some(&Value::from(2)));
}
