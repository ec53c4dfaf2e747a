//! Custom Functions Example
//!
//! Registers host functions through a function provider and shares one
//! engine between worker threads. Every thread compiles the same expression;
//! the artifact cache compiles it once.

use feel_sdk::{FType, FeelEngineBuilder, NativeFunction, NativeFunctionFactory, Value};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    println!("=== Custom Functions Example ===\n");

    let vat = NativeFunction::new(
        "vat",
        FType::function(
            vec![("amount", FType::NUMBER), ("country", FType::String)],
            FType::DOUBLE,
        ),
        |args| {
            let amount = args.first().and_then(Value::as_number).map(|n| n.to_f64());
            let rate = match args.get(1).and_then(Value::as_str) {
                Some("DE") => Some(0.19),
                Some("FR") => Some(0.20),
                Some("US") => Some(0.0),
                _ => None,
            };
            match (amount, rate) {
                (Some(amount), Some(rate)) => Value::from(amount * rate),
                _ => Value::Null,
            }
        },
    );
    let functions = NativeFunctionFactory::new().with(vat);

    let engine = Arc::new(
        FeelEngineBuilder::new()
            .with_function_factory(Arc::new(functions))
            .build()?,
    );

    let input_type = FType::context([("amount", FType::NUMBER), ("country", FType::String)]);
    let orders = [(100, "DE"), (250, "FR"), (80, "US"), (40, "XX")];

    let mut handles = Vec::new();
    for (amount, country) in orders {
        let engine = engine.clone();
        let input_type = input_type.clone();
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            let expression = engine.compile_expression("amount + vat(amount, country)", input_type)?;
            let input = Value::context([("amount", Value::from(amount)), ("country", Value::from(country))]);
            let result = expression.eval(&input);
            Ok(format!("{:>4} {} => {}", amount, country, result.into_result().unwrap_or_default()))
        }));
    }
    for handle in handles {
        println!("{}", handle.await??);
    }

    println!("\nCompilations performed: {}", engine.compilations());
    Ok(())
}
