//! Unit tests for feel-compiler
//!
//! Compiles expressions, unary tests and decision tables through the public
//! `Compiler` API and checks the generated programs.

use feel_compiler::{
    BuiltinFunctionFactory, CompileError, Compiler, CompilerOptions, CompilerTask,
    DefaultTypeFactory, FeelFunctionFactory, FeelTypeFactory, NativeFunctionFactory,
};
use feel_core::ast::InfixOp;
use feel_core::dmn::{DecisionRule, DecisionTableDefinition, HitPolicy, InputClause, OutputClause};
use feel_core::ir::{CallTarget, Ir, Program};
use feel_core::types::NativeFunction;
use feel_core::{FType, Value};
use std::sync::Arc;

fn expression(source: &str) -> CompilerTask {
    CompilerTask::builder().source(source).build()
}

fn typed(source: &str, input: FType) -> CompilerTask {
    CompilerTask::builder().source(source).input_type(input).build()
}

fn number(text: &str) -> Value {
    Value::Number(feel_core::Number::parse_literal(text).unwrap())
}

/// Value of a root that folded to a constant, inline or pooled
fn folded(program: &Program) -> Option<&Value> {
    match &program.root {
        Ir::Const(value) => Some(value),
        Ir::ConstRef(index) => program.constants.get(*index),
        _ => None,
    }
}

// ========== Expression Tests ==========

#[test]
fn test_constant_expressions_fold() {
    let compiler = Compiler::new();
    let cases = [
        ("1 + 2 * 3", Value::from(7)),
        ("0.1 + 0.2", number("0.3")),
        ("\"a\" + \"b\"", Value::string("ab")),
        ("if 1 > 2 then \"x\" else \"y\"", Value::string("y")),
        ("not(true)", Value::Boolean(false)),
        ("null + 1", Value::Null),
    ];
    for (source, expected) in cases {
        let program = compiler.compile_expression(&expression(source)).unwrap();
        assert_eq!(folded(&program), Some(&expected), "{}", source);
    }
}

#[test]
fn test_typed_input_fields() -> anyhow::Result<()> {
    let input = FType::context([("a", FType::INTEGER), ("b", FType::INTEGER)]);
    let program = Compiler::new().compile_expression(&typed("a + b", input))?;
    assert_eq!(program.result_type, FType::INTEGER);
    assert!(matches!(program.root, Ir::Arith { .. }));
    Ok(())
}

#[test]
fn test_untyped_input_is_dynamic() {
    let program = Compiler::new().compile_expression(&expression("a + b")).unwrap();
    assert_eq!(program.result_type, FType::Any);
    assert!(matches!(program.root, Ir::Dynamic { .. }));
}

#[test]
fn test_declared_inputs_shadow_root_fields() {
    let task = CompilerTask::builder()
        .source("x")
        .input_type(FType::context([("x", FType::String)]))
        .input("x", FType::Boolean)
        .build();
    let program = Compiler::new().compile_expression(&task).unwrap();
    assert_eq!(program.result_type, FType::Boolean);
}

#[test]
fn test_incompatible_operands_warn() {
    let program = Compiler::new().compile_expression(&expression("true * 2")).unwrap();
    assert_eq!(program.root, Ir::null());
    assert_eq!(program.metadata.warnings.len(), 1);
    assert!(program.metadata.warnings[0].contains("'*'"));
}

#[test]
fn test_builtin_calls() {
    let program = Compiler::new()
        .compile_expression(&typed(
            "sum(xs)",
            FType::context([("xs", FType::list(FType::INTEGER))]),
        ))
        .unwrap();
    assert!(matches!(
        &program.root,
        Ir::Call { target: CallTarget::Builtin(name), .. } if name == "sum"
    ));
}

#[test]
fn test_named_arguments_are_reordered() {
    let program = Compiler::new()
        .compile_expression(&typed(
            "substring(start position: 2, string: s)",
            FType::context([("s", FType::String)]),
        ))
        .unwrap();
    let Ir::Call { args, .. } = &program.root else {
        panic!("expected a call, got {:?}", program.root);
    };
    assert_eq!(args[0], Ir::InputField("s".to_string()));
}

#[test]
fn test_unknown_function_is_unresolved() {
    let err = Compiler::new()
        .compile_expression(&typed("frobnicate(1)", FType::context([("a", FType::INTEGER)])))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "frobnicate"));

    let err = Compiler::new()
        .compile_expression(&expression("frobnicate(1)"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "frobnicate"));
}

#[test]
fn test_loose_names_without_strict_mode() {
    let compiler = Compiler::with_options(CompilerOptions {
        strict_names: false,
        ..CompilerOptions::default()
    });
    let task = typed("missing + 1", FType::context([("a", FType::INTEGER)]));
    let program = compiler.compile_expression(&task).unwrap();
    assert_eq!(program.result_type, FType::Any);
}

#[test]
fn test_decimal_precision_is_recorded() {
    let compiler = Compiler::with_options(CompilerOptions {
        decimal_precision: 4,
        ..CompilerOptions::default()
    });
    let program = compiler.compile_expression(&expression("2 / 3")).unwrap();
    assert_eq!(program.metadata.decimal_precision(), 4);
    assert_eq!(folded(&program), Some(&number("0.6667")));
}

// ========== Unary Test Tests ==========

#[test]
fn test_unary_tests_against_typed_input() {
    let task = CompilerTask::builder()
        .source("< 10, [20..30]")
        .test_input_type(FType::INTEGER)
        .build();
    let program = Compiler::new().compile_unary_tests(&task).unwrap();
    assert_eq!(program.result_type, FType::Boolean);
    assert!(program.root.reads_test_input());
}

#[test]
fn test_dash_is_always_true() {
    let program = Compiler::new().compile_unary_tests(&expression("-")).unwrap();
    assert_eq!(program.root, Ir::Const(Value::Boolean(true)));
}

#[test]
fn test_untyped_value_test_matches_at_runtime() {
    let program = Compiler::new().compile_unary_tests(&expression("x")).unwrap();
    assert!(matches!(program.root, Ir::UnaryMatch { .. }));
}

// ========== Decision Table Tests ==========

fn simple_table(hit_policy: HitPolicy) -> DecisionTableDefinition {
    DecisionTableDefinition::builder()
        .name("simple")
        .input(InputClause::new("a + b"))
        .input(InputClause::new("a").with_allowed_values("1, 2"))
        .output(OutputClause::unnamed())
        .hit_policy(hit_policy)
        .rule(
            DecisionRule::builder()
                .input("3")
                .input("-")
                .output("\"hello world\"")
                .build(),
        )
        .rule(
            DecisionRule::builder()
                .input(">= 3")
                .input("1")
                .output("\"hello world 2\"")
                .build(),
        )
        .build()
        .unwrap()
}

#[test]
fn test_compile_decision_table() {
    let program = Compiler::new()
        .compile_decision_table(&simple_table(HitPolicy::First), &expression(""))
        .unwrap();
    assert_eq!(program.metadata.source_type, "decision table");
    assert_eq!(program.result_type, FType::String);
    assert_eq!(
        program.metadata.custom.get("decision").map(String::as_str),
        Some("simple")
    );
    let Ir::DecisionTable(table) = &program.root else {
        panic!("expected a decision table");
    };
    assert_eq!(table.hit_policy, HitPolicy::First);
    assert_eq!(table.rules.len(), 2);
}

#[test]
fn test_table_source_is_the_definition() {
    let program = Compiler::new()
        .compile_decision_table(&simple_table(HitPolicy::Unique), &expression("ignored"))
        .unwrap();
    let source = program.metadata.source.unwrap();
    assert!(source.contains("\"simple\""));
}

#[test]
fn test_invalid_definition_is_structural_error() {
    let mut definition = simple_table(HitPolicy::Unique);
    definition.rules[0].input_entries.pop();
    let err = Compiler::new()
        .compile_decision_table(&definition, &expression(""))
        .unwrap_err();
    assert!(matches!(err, CompileError::Structural(_)));
}

#[test]
fn test_multi_output_table_is_a_context() {
    let definition = DecisionTableDefinition::builder()
        .name("pricing")
        .input(InputClause::new("tier"))
        .output(OutputClause::named("discount"))
        .output(OutputClause::named("label"))
        .rule(
            DecisionRule::builder()
                .input("\"gold\"")
                .output("0.2")
                .output("\"Gold\"")
                .build(),
        )
        .build()
        .unwrap();
    let program = Compiler::new()
        .compile_decision_table(&definition, &typed("", FType::context([("tier", FType::String)])))
        .unwrap();
    let FType::Context(fields) = &program.result_type else {
        panic!("expected a context type, got {}", program.result_type);
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].0, "discount");
}

// ========== Extension Tests ==========

#[test]
fn test_native_functions_are_callable() {
    let natives = NativeFunctionFactory::new().with(NativeFunction::new(
        "double",
        FType::function(vec![("x", FType::NUMBER)], FType::NUMBER),
        |args| match args.first() {
            Some(Value::Number(n)) => n
                .arith(InfixOp::Add, n, true)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
    ));
    let compiler = Compiler::with_factories(
        CompilerOptions::default(),
        Arc::from(vec![Arc::new(DefaultTypeFactory::new()) as Arc<dyn FeelTypeFactory>]),
        Arc::from(vec![
            Arc::new(natives) as Arc<dyn FeelFunctionFactory>,
            Arc::new(BuiltinFunctionFactory::new()) as Arc<dyn FeelFunctionFactory>,
        ]),
    );
    let program = compiler.compile_expression(&expression("double(2)")).unwrap();
    assert_eq!(program.result_type, FType::NUMBER);
    assert_eq!(program.constants.len(), 1);
}
