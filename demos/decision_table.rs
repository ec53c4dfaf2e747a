//! Decision Table Example
//!
//! Loads a DMN decision table definition from JSON, compiles it once and
//! evaluates it for several applicants.

use feel_sdk::{DecisionTableDefinition, FType, FeelEngine, FeelTyped, Value};
use serde::Serialize;

const DEFINITION: &str = r#"{
    "name": "loan eligibility",
    "inputs": [
        {"expression": "age"},
        {"expression": "income"},
        {"expression": "rating", "allowed_values": "\"A\", \"B\", \"C\""}
    ],
    "outputs": [
        {"name": "decision", "allowed_values": "\"approve\", \"review\", \"decline\""},
        {"name": "limit"}
    ],
    "rules": [
        {"input_entries": ["< 18", "-", "-"], "output_entries": ["\"decline\"", "0"]},
        {"input_entries": [">= 18", ">= 50000", "\"A\""], "output_entries": ["\"approve\"", "income * 0.5"]},
        {"input_entries": [">= 18", ">= 50000", "\"B\", \"C\""], "output_entries": ["\"review\"", "income * 0.2"]},
        {"input_entries": [">= 18", "< 50000", "-"], "output_entries": ["\"review\"", "min([income * 0.1, 2000])"]}
    ],
    "hit_policy": "UNIQUE"
}"#;

#[derive(Serialize)]
struct Applicant {
    age: i32,
    income: f64,
    rating: String,
}

impl FeelTyped for Applicant {
    fn feel_type() -> FType {
        FType::context([
            ("age", FType::INTEGER),
            ("income", FType::DOUBLE),
            ("rating", FType::String),
        ])
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    println!("=== Decision Table Example ===\n");
    let definition = DecisionTableDefinition::from_json(DEFINITION)?;

    let engine = FeelEngine::new();
    let table = engine.compile_decision_table_for::<Applicant>(&definition)?;
    println!(
        "Compiled '{}' ({} rules, hit policy {}) -> {}\n",
        table.definition().name,
        table.definition().rules.len(),
        table.definition().hit_policy,
        table.result_type()
    );

    let applicants = [
        Applicant { age: 16, income: 0.0, rating: "A".to_string() },
        Applicant { age: 34, income: 82000.0, rating: "A".to_string() },
        Applicant { age: 41, income: 61000.0, rating: "C".to_string() },
        Applicant { age: 29, income: 30000.0, rating: "B".to_string() },
        Applicant { age: 29, income: 90000.0, rating: "Z".to_string() },
    ];
    for applicant in &applicants {
        let result = table.evaluate(&Value::from_serialize(applicant)?);
        println!(
            "age={:<3} income={:<8} rating={} => {}",
            applicant.age,
            applicant.income,
            applicant.rating,
            serde_json::to_string(&result)?
        );
    }
    Ok(())
}
