//! Decision table generator
//!
//! Lowers a validated `DecisionTableDefinition` to one `Ir::DecisionTable`
//! node. Input expressions and output entries are compiled as FEEL
//! expressions, input cells as unary tests against their column's value, and
//! output allowed values both as a whole (the check) and test by test (the
//! priority order).

use crate::codegen::CodeFragment;
use crate::compiler::Compiler;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::dmn::{Aggregation, DecisionTableDefinition};
use feel_core::ir::{DecisionIr, Ir, OutputIr, RuleIr};
use feel_core::FType;
use feel_parser::{Syntax, SyntaxKind};
use tracing::debug;

/// Generates decision table IR
pub struct DecisionTableGenerator<'c> {
    compiler: &'c Compiler,
}

impl<'c> DecisionTableGenerator<'c> {
    pub fn new(compiler: &'c Compiler) -> Self {
        Self { compiler }
    }

    /// Generate the table. The definition must already be validated.
    pub fn generate(
        &self,
        ctx: &mut TranslationContext,
        definition: &DecisionTableDefinition,
    ) -> Result<CodeFragment> {
        let mut inputs = Vec::with_capacity(definition.inputs.len());
        let mut input_types = Vec::with_capacity(definition.inputs.len());
        let mut allowed_inputs = Vec::with_capacity(definition.inputs.len());
        for clause in &definition.inputs {
            let input = self.compiler.lower_expression(ctx, &clause.expression)?;
            let allowed = match &clause.allowed_values {
                Some(allowed) => Some(self.unary_tests(ctx, allowed, &input.ftype)?),
                None => None,
            };
            inputs.push(input.ir);
            input_types.push(input.ftype);
            allowed_inputs.push(allowed);
        }

        let mut column_types: Vec<Option<FType>> = vec![None; definition.outputs.len()];
        let mut rules = Vec::with_capacity(definition.rules.len());
        for rule in &definition.rules {
            let mut conditions = Vec::with_capacity(rule.input_entries.len());
            for (i, entry) in rule.input_entries.iter().enumerate() {
                let condition = match (entry.trim(), &allowed_inputs[i]) {
                    ("-", Some(allowed)) => allowed.clone(),
                    _ => self.unary_tests(ctx, entry, &input_types[i])?,
                };
                conditions.push(condition);
            }

            let mut outputs = Vec::with_capacity(rule.output_entries.len());
            for (j, entry) in rule.output_entries.iter().enumerate() {
                let output = self.compiler.lower_expression(ctx, entry)?;
                column_types[j] = Some(match column_types[j].take() {
                    Some(seen) => seen.min_super(&output.ftype),
                    None => output.ftype,
                });
                outputs.push(output.ir);
            }
            rules.push(RuleIr {
                conditions,
                outputs,
            });
        }

        let mut outputs = Vec::with_capacity(definition.outputs.len());
        for clause in &definition.outputs {
            let (check, priorities) = match &clause.allowed_values {
                Some(allowed) => (
                    Some(self.unary_tests(ctx, allowed, &FType::Any)?),
                    self.priorities(ctx, allowed)?,
                ),
                None => (None, Vec::new()),
            };
            let default = match &clause.default_entry {
                Some(entry) => Some(self.compiler.lower_expression(ctx, entry)?.ir),
                None => None,
            };
            outputs.push(OutputIr {
                name: clause.name.clone(),
                check,
                priorities,
                default,
            });
        }

        let single_output = definition.has_single_unnamed_output();
        let ftype = result_type(definition, column_types, single_output);
        debug!(
            decision = %definition.name,
            hit_policy = %definition.hit_policy,
            rules = rules.len(),
            "generated decision table"
        );

        let table = DecisionIr {
            name: definition.name.clone(),
            inputs,
            rules,
            outputs,
            hit_policy: definition.hit_policy,
            aggregation: definition.aggregation,
            single_output,
        };
        Ok(CodeFragment::new(Ir::DecisionTable(Box::new(table)), ftype))
    }

    /// Compile unary tests with `?` typed as `subject`
    fn unary_tests(&self, ctx: &mut TranslationContext, source: &str, subject: &FType) -> Result<Ir> {
        let previous = ctx.replace_test_input_type(Some(subject.clone()));
        let lowered = self
            .compiler
            .parse_unary_tests(ctx, source)
            .and_then(|syntax| self.compiler.lower_unary_tests(ctx, source, &syntax));
        ctx.replace_test_input_type(previous);
        Ok(lowered?.ir)
    }

    /// One test per positive unary test of an allowed-values list, in order.
    ///
    /// Negated lists and `-` give no priorities.
    fn priorities(&self, ctx: &mut TranslationContext, allowed: &str) -> Result<Vec<Ir>> {
        let syntax = self.compiler.parse_unary_tests(ctx, allowed)?;
        let SyntaxKind::UnaryTests {
            negated: false,
            tests,
        } = &syntax.kind
        else {
            return Ok(Vec::new());
        };

        let previous = ctx.replace_test_input_type(Some(FType::Any));
        let mut priorities = Vec::with_capacity(tests.len());
        let mut failure = None;
        for test in tests {
            let single = Syntax::new(
                SyntaxKind::UnaryTests {
                    negated: false,
                    tests: vec![test.clone()],
                },
                test.span,
            );
            match self.compiler.lower_unary_tests(ctx, allowed, &single) {
                Ok(fragment) => priorities.push(fragment.ir),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        ctx.replace_test_input_type(previous);
        match failure {
            Some(err) => Err(err),
            None => Ok(priorities),
        }
    }
}

/// Static type of a table's result
fn result_type(
    definition: &DecisionTableDefinition,
    columns: Vec<Option<FType>>,
    single_output: bool,
) -> FType {
    let columns: Vec<FType> = columns
        .into_iter()
        .map(|c| c.unwrap_or(FType::Any))
        .collect();
    let row = if single_output {
        columns.into_iter().next().unwrap_or(FType::Any)
    } else {
        FType::Context(
            definition
                .outputs
                .iter()
                .zip(columns)
                .map(|(clause, t)| (clause.name.clone().unwrap_or_default(), t))
                .collect(),
        )
    };
    if !definition.hit_policy.is_multi_hit() {
        return row;
    }
    match definition.aggregation {
        Some(Aggregation::Count) => FType::INTEGER,
        Some(Aggregation::Sum) => FType::NUMBER,
        Some(Aggregation::Min | Aggregation::Max) => row,
        None => FType::list(row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CompilerTask;
    use feel_core::dmn::{DecisionRule, HitPolicy, InputClause, OutputClause};

    fn greeting_table() -> DecisionTableDefinition {
        DecisionTableDefinition::builder()
            .name("greeting")
            .input(InputClause::new("a + b"))
            .input(InputClause::new("a").with_allowed_values("\"1\""))
            .output(OutputClause::unnamed())
            .rule(
                DecisionRule::builder()
                    .input("3")
                    .input("-")
                    .output("\"hello world\"")
                    .build(),
            )
            .rule(
                DecisionRule::builder()
                    .input("2")
                    .input("-")
                    .output("\"hello world 2\"")
                    .build(),
            )
            .build()
            .unwrap()
    }

    fn generate(definition: &DecisionTableDefinition) -> Result<CodeFragment> {
        let compiler = Compiler::new();
        let task = CompilerTask::builder().build();
        let mut ctx = compiler.context(&task);
        DecisionTableGenerator::new(&compiler).generate(&mut ctx, definition)
    }

    #[test]
    fn test_generate_shape() {
        let fragment = generate(&greeting_table()).unwrap();
        assert_eq!(fragment.ftype, FType::String);
        let Ir::DecisionTable(table) = fragment.ir else {
            panic!("expected a decision table");
        };
        assert_eq!(table.inputs.len(), 2);
        assert_eq!(table.rules.len(), 2);
        assert!(table.single_output);
        assert_eq!(table.hit_policy, HitPolicy::Unique);
        // `-` under allowed values becomes the allowed-values test
        assert_ne!(table.rules[0].conditions[1], Ir::Const(feel_core::Value::Boolean(true)));
    }

    #[test]
    fn test_priorities_follow_allowed_values() {
        let definition = DecisionTableDefinition::builder()
            .name("risk")
            .input(InputClause::new("score"))
            .output(OutputClause::unnamed().with_allowed_values("\"high\", \"medium\", \"low\""))
            .hit_policy(HitPolicy::Priority)
            .rule(DecisionRule::builder().input("> 50").output("\"high\"").build())
            .rule(DecisionRule::builder().input("-").output("\"low\"").build())
            .build()
            .unwrap();
        let fragment = generate(&definition).unwrap();
        let Ir::DecisionTable(table) = fragment.ir else {
            panic!("expected a decision table");
        };
        assert_eq!(table.outputs[0].priorities.len(), 3);
        assert!(table.outputs[0].check.is_some());
    }

    #[test]
    fn test_multi_hit_result_types() {
        let definition = DecisionTableDefinition::builder()
            .name("fees")
            .input(InputClause::new("amount"))
            .output(OutputClause::unnamed())
            .hit_policy(HitPolicy::Collect)
            .rule(DecisionRule::builder().input("> 10").output("1").build())
            .rule(DecisionRule::builder().input("> 100").output("2").build())
            .build()
            .unwrap();
        assert_eq!(generate(&definition).unwrap().ftype, FType::list(FType::INTEGER));

        let counted = DecisionTableDefinition {
            aggregation: Some(Aggregation::Count),
            ..definition
        };
        assert_eq!(generate(&counted).unwrap().ftype, FType::INTEGER);
    }

    #[test]
    fn test_bad_cell_fails_the_compile() {
        let definition = DecisionTableDefinition::builder()
            .name("broken")
            .input(InputClause::new("x"))
            .output(OutputClause::unnamed())
            .rule(DecisionRule::builder().input("> > 1").output("1").build())
            .build()
            .unwrap();
        assert!(generate(&definition).is_err());
    }
}
