//! Simple Expression Example
//!
//! Compiles a handful of FEEL expressions and unary tests and evaluates them
//! against JSON inputs.
//!
//! Run with `RUST_LOG=debug` to see each generated program.

use feel_sdk::{FType, FeelEngineBuilder, Value};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    println!("=== FEEL Expressions ===\n");
    let engine = FeelEngineBuilder::new().build()?;

    let order = Value::from(json!({
        "items": [
            {"sku": "A-1", "price": 19.99, "quantity": 2},
            {"sku": "B-7", "price": 5.25, "quantity": 10}
        ],
        "customer": {"name": "Ada", "since": "2019-03-01"}
    }));

    let expressions = [
        "1 + 1",
        "0.1 + 0.2",
        "sum(for item in items return item.price * item.quantity)",
        "items[price > 10].sku",
        "count(items) > 1 and customer.name = \"Ada\"",
        "years and months duration(date(customer.since), date(\"2024-04-11\")).years",
        "some item in items satisfies item.quantity >= 10",
    ];
    for source in expressions {
        let expression = engine.compile_expression_for_value(source, &order)?;
        let result = expression.eval(&order);
        match result.clone().into_result() {
            Ok(value) => println!("{:<72} => {} : {}", source, value, expression.result_type()),
            Err(message) => println!("{:<72} => error: {}", source, message),
        }
    }

    println!("\n=== Unary Tests ===\n");
    let tests = ["> 10", "[1..5]", "not(3, 4)", "-", "? * 2 = 8"];
    for source in tests {
        let test = engine.compile_unary_test(source, FType::NUMBER, FType::Any)?;
        let passing: Vec<i32> = (0..12)
            .filter(|n| test.test(&Value::from(*n), &Value::Null))
            .collect();
        println!("{:<12} passes {:?}", source, passing);
    }

    println!("\nCompilations performed: {}", engine.compilations());
    Ok(())
}
