//! AST to IR lowering
//!
//! One exhaustive match over node kinds. Operators, members, range stepping,
//! conversions and calls are delegated to the type and function factories;
//! the visitor only handles what no factory answers.

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::{CompileError, Result};
use crate::factory::{FeelFunctionFactory, FeelTypeFactory};
use feel_core::ast::{AstNode, Callee, InfixOp, Iteration, NameOrigin, NodeKind};
use feel_core::ir::{Binding, CallTarget, Domain, Ir};
use feel_core::types::RangeValue;
use feel_core::{ops, CompatRank, FType, Value};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Lowers typed AST nodes to code fragments
pub struct AstCompiler<'a> {
    ctx: &'a mut TranslationContext,
}

impl<'a> AstCompiler<'a> {
    pub fn new(ctx: &'a mut TranslationContext) -> Self {
        Self { ctx }
    }

    fn folding(&self) -> bool {
        self.ctx.options().enable_constant_folding
    }

    /// Lower one node and its subtree
    pub fn compile(&mut self, node: &AstNode) -> Result<CodeFragment> {
        match &node.kind {
            // Literals
            NodeKind::Null => Ok(CodeFragment::null()),
            NodeKind::Boolean(b) => Ok(CodeFragment::constant(Value::Boolean(*b), self.ctx)),
            NodeKind::Number(n) => Ok(CodeFragment::typed_constant(
                Value::Number(n.clone()),
                node.ftype.clone(),
                self.ctx,
            )),
            NodeKind::String(s) => Ok(CodeFragment::constant(Value::String(s.clone()), self.ctx)),
            NodeKind::Temporal(value) => Ok(CodeFragment::typed_constant(
                value.clone(),
                node.ftype.clone(),
                self.ctx,
            )),

            // Structural
            NodeKind::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.compile(item))
                    .collect::<Result<Vec<_>>>()?;
                if self.folding() && items.iter().all(CodeFragment::is_constant) {
                    let values = items.into_iter().filter_map(|i| i.constant).collect();
                    return Ok(self.typed_constant(Value::List(values), node));
                }
                let ir = Ir::List(items.into_iter().map(|i| i.ir).collect());
                Ok(CodeFragment::new(ir, node.ftype.clone()).non_null())
            }
            NodeKind::Context(entries) => {
                let mut lowered = Vec::with_capacity(entries.len());
                for entry in entries {
                    lowered.push((entry.name.clone(), self.compile(&entry.value)?));
                }
                if self.folding() && lowered.iter().all(|(_, f)| f.is_constant()) {
                    let values: IndexMap<String, Value> = lowered
                        .into_iter()
                        .filter_map(|(name, f)| f.constant.map(|v| (name, v)))
                        .collect();
                    return Ok(self.typed_constant(Value::Context(values), node));
                }
                let ir = Ir::Context(lowered.into_iter().map(|(n, f)| (n, f.ir)).collect());
                Ok(CodeFragment::new(ir, node.ftype.clone()).non_null())
            }
            NodeKind::Range {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => {
                let start = start.as_deref().map(|s| self.compile(s)).transpose()?;
                let end = end.as_deref().map(|e| self.compile(e)).transpose()?;
                let bounds_constant = start.iter().chain(end.iter()).all(CodeFragment::is_constant);
                if self.folding() && bounds_constant {
                    let range = RangeValue::new(
                        start.and_then(|s| s.constant),
                        end.and_then(|e| e.constant),
                        *start_inclusive,
                        *end_inclusive,
                    );
                    return Ok(self.typed_constant(Value::Range(Box::new(range)), node));
                }
                let ir = Ir::Range {
                    start: start.map(|s| s.ir.boxed()),
                    end: end.map(|e| e.ir.boxed()),
                    start_inclusive: *start_inclusive,
                    end_inclusive: *end_inclusive,
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()).non_null())
            }

            // Operators
            NodeKind::Infix { op, left, right } => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                self.infix(node, &left, &right, *op)
            }
            NodeKind::Negation(operand) => {
                let operand = self.compile(operand)?;
                if let (true, Some(value)) = (self.folding(), &operand.constant) {
                    let negated = ops::negate(value);
                    return Ok(self.typed_constant(negated, node));
                }
                let nullable = operand.nullable;
                let ir = Ir::Negate(operand.ir.boxed());
                Ok(CodeFragment::new(ir, node.ftype.clone()).with_nullable(nullable))
            }
            NodeKind::Between { value, low, high } => {
                let ir = Ir::Between {
                    value: self.compile(value)?.ir.boxed(),
                    low: self.compile(low)?.ir.boxed(),
                    high: self.compile(high)?.ir.boxed(),
                };
                Ok(CodeFragment::new(ir, FType::Boolean))
            }
            NodeKind::In { value, tests } => {
                let value = self.compile(value)?;
                let previous = self.ctx.replace_test_input_type(Some(value.ftype.clone()));
                let tests = self.compile(tests);
                self.ctx.replace_test_input_type(previous);
                let tests = tests?;
                let ir = Ir::WithTestInput {
                    subject: value.ir.boxed(),
                    body: tests.ir.boxed(),
                };
                Ok(CodeFragment::new(ir, FType::Boolean))
            }
            NodeKind::InstanceOf { value, target } => {
                let value = self.compile(value)?;
                if let (true, Some(constant)) = (self.folding(), &value.constant) {
                    let is = target.is_instance(constant);
                    return Ok(CodeFragment::constant(Value::Boolean(is), self.ctx));
                }
                let ir = Ir::InstanceOf {
                    value: value.ir.boxed(),
                    target: target.clone(),
                };
                Ok(CodeFragment::new(ir, FType::Boolean).non_null())
            }

            // Control
            NodeKind::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.compile(condition)?;
                let then = self.compile(then)?;
                let otherwise = self.compile(otherwise)?;
                if let (true, Some(value)) = (self.folding(), &condition.constant) {
                    let taken = if *value == Value::Boolean(true) {
                        then
                    } else {
                        otherwise
                    };
                    return Ok(CodeFragment {
                        ftype: node.ftype.clone(),
                        ..taken
                    });
                }
                let nullable = then.nullable || otherwise.nullable;
                let ir = Ir::If {
                    condition: condition.ir.boxed(),
                    then: then.ir.boxed(),
                    otherwise: otherwise.ir.boxed(),
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()).with_nullable(nullable))
            }
            NodeKind::For { iterators, body } => {
                let iterators = self.bindings(iterators)?;
                let body = self.compile(body)?;
                let ir = Ir::For {
                    iterators,
                    body: body.ir.boxed(),
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()).non_null())
            }
            NodeKind::Quantified {
                every,
                iterators,
                condition,
            } => {
                let iterators = self.bindings(iterators)?;
                let condition = self.compile(condition)?;
                let ir = Ir::Quantified {
                    every: *every,
                    iterators,
                    condition: condition.ir.boxed(),
                };
                Ok(CodeFragment::new(ir, FType::Boolean))
            }
            NodeKind::Filter {
                source,
                filter,
                kind,
            } => {
                let source = self.compile(source)?;
                let filter = self.compile(filter)?;
                let ir = Ir::Filter {
                    source: source.ir.boxed(),
                    filter: filter.ir.boxed(),
                    kind: *kind,
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()))
            }
            NodeKind::FunctionDefinition { params, body } => {
                let body = self.compile(body)?;
                let ir = Ir::Function {
                    params: params.iter().map(|(name, _)| name.clone()).collect(),
                    body: Arc::new(body.ir),
                    ftype: node.ftype.clone(),
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()).non_null())
            }
            NodeKind::Invocation {
                callee,
                args,
                names,
            } => self.invocation(node, callee, args, names),
            NodeKind::Path { source, member } => {
                let source = self.compile(source)?;
                self.ctx
                    .type_factory()
                    .member(node, &source, member, self.ctx)?
                    .ok_or_else(|| CompileError::unresolved(member, node.span))
            }

            // References
            NodeKind::Name { name, origin } => self.name(node, name, *origin),
            NodeKind::TestInput => Ok(CodeFragment::new(Ir::TestInput, node.ftype.clone())),

            // Unary tests
            NodeKind::UnaryTests { negated, tests } => {
                let subject = self.ctx.test_input_type().cloned().unwrap_or(FType::Any);
                let mut combined: Option<CodeFragment> = None;
                for test in tests {
                    let test = self.positive_test(test, &subject)?;
                    combined = Some(match combined {
                        Some(acc) => self.infix(node, &acc, &test, InfixOp::Or)?,
                        None => test,
                    });
                }
                let combined = combined.unwrap_or_else(|| {
                    CodeFragment::constant(Value::Boolean(false), self.ctx)
                });
                if !negated {
                    return Ok(combined);
                }
                if let (true, Some(value)) = (self.folding(), &combined.constant) {
                    return Ok(CodeFragment::constant(ops::not(value), self.ctx));
                }
                Ok(CodeFragment::new(Ir::Not(combined.ir.boxed()), FType::Boolean))
            }
            NodeKind::Dash => Ok(CodeFragment::constant(Value::Boolean(true), self.ctx)),
            NodeKind::UnaryComparison { op, value } => {
                let subject_type = self.ctx.test_input_type().cloned().unwrap_or(FType::Any);
                let subject = CodeFragment::new(Ir::TestInput, subject_type);
                let value = self.compile(value)?;
                self.infix(node, &subject, &value, *op)
            }
        }
    }

    /// Lower one positive unary test against a test input of type `subject`
    fn positive_test(&mut self, test: &AstNode, subject: &FType) -> Result<CodeFragment> {
        if matches!(test.kind, NodeKind::Dash | NodeKind::UnaryComparison { .. })
            || test.uses_test_input()
        {
            return self.compile(test);
        }
        let value = self.compile(test)?;
        let input = || Ir::TestInput.boxed();
        let ir = match &value.ftype {
            FType::List(_) if !subject.is_list() => Ir::ListContains {
                list: value.ir.boxed(),
                value: input(),
            },
            FType::Range { .. } => Ir::RangeContains {
                range: value.ir.boxed(),
                value: input(),
            },
            FType::Boolean if !subject.is_boolean() && !subject.is_any() => return Ok(value),
            FType::Any | FType::Boolean if subject.is_any() || value.ftype.is_any() => {
                Ir::UnaryMatch {
                    test: value.ir.boxed(),
                }
            }
            _ => {
                let input = CodeFragment::new(Ir::TestInput, subject.clone());
                return self.infix(test, &input, &value, InfixOp::Eq);
            }
        };
        Ok(CodeFragment::new(ir, FType::Boolean))
    }

    /// Lower a binary operator through the type factories, with the visitor's
    /// own fallback for combinations no factory handles
    pub(crate) fn infix(
        &mut self,
        node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
    ) -> Result<CodeFragment> {
        let factory = self.ctx.type_factory();
        if let Some(fragment) = factory.infix_op(node, left, right, op, self.ctx)? {
            return Ok(fragment);
        }

        let result = op.result_type(&left.ftype, &right.ftype);
        if result.is_any() || left.ftype.is_any() || right.ftype.is_any() {
            let ir = Ir::Dynamic {
                op,
                left: left.ir.clone().boxed(),
                right: right.ir.clone().boxed(),
            };
            return Ok(CodeFragment::new(ir, result));
        }
        if result.is_null() {
            debug!(op = %op, left = %left.ftype, right = %right.ftype, "operator always yields null");
            return Ok(CodeFragment::null());
        }
        Err(CompileError::translation(
            format!(
                "no rule lowers '{}' on {} and {}",
                op, left.ftype, right.ftype
            ),
            node.span,
            &[&left.ir, &right.ir],
        ))
    }

    fn bindings(&mut self, iterators: &[Iteration]) -> Result<Vec<Binding>> {
        iterators
            .iter()
            .map(|iterator| {
                Ok(Binding {
                    name: iterator.name.clone(),
                    domain: self.domain(&iterator.domain)?,
                })
            })
            .collect()
    }

    fn domain(&mut self, domain: &AstNode) -> Result<Domain> {
        if let NodeKind::Range {
            start: Some(start),
            end: Some(end),
            start_inclusive,
            end_inclusive,
        } = &domain.kind
        {
            let start = self.compile(start)?;
            let end = self.compile(end)?;
            let element = domain.ftype.element_type();
            let factory = self.ctx.type_factory();
            if let Some(steps) = factory.foreach(
                &start,
                &end,
                *start_inclusive,
                *end_inclusive,
                &element,
                self.ctx,
            )? {
                return Ok(steps);
            }
        }
        Ok(Domain::Values(self.compile(domain)?.ir))
    }

    fn invocation(
        &mut self,
        node: &AstNode,
        callee: &Callee,
        args: &[AstNode],
        names: &Option<Vec<String>>,
    ) -> Result<CodeFragment> {
        let args = args
            .iter()
            .map(|arg| self.compile(arg))
            .collect::<Result<Vec<_>>>()?;

        match callee {
            Callee::Named { name, signature } => {
                let args = match signature {
                    FType::Function { params, .. } => args
                        .into_iter()
                        .zip(params)
                        .map(|(arg, param)| self.convert(arg, param))
                        .collect::<Result<Vec<_>>>()?,
                    _ => args,
                };
                let functions = self.ctx.function_factory();
                let mut lowered = functions
                    .function(node, name, args, self.ctx)?
                    .ok_or_else(|| {
                        CompileError::translation(
                            format!("no function factory lowers '{}'", name),
                            node.span,
                            &[],
                        )
                    })?;
                if lowered.ftype.is_any() && !node.ftype.is_any() {
                    lowered.ftype = node.ftype.clone();
                }
                Ok(lowered)
            }
            Callee::Value(callee) => {
                let callee = self.compile(callee)?;
                let ir = Ir::Call {
                    target: CallTarget::Value(callee.ir.boxed()),
                    args: args.into_iter().map(|a| a.ir).collect(),
                    names: names.clone(),
                };
                Ok(CodeFragment::new(ir, node.ftype.clone()))
            }
        }
    }

    /// Convert an argument to a parameter type when the ranks call for it
    fn convert(&mut self, arg: CodeFragment, param: &FType) -> Result<CodeFragment> {
        match arg.ftype.can_be(param) {
            CompatRank::Convertible | CompatRank::LossyConvertible => {
                let factory = self.ctx.type_factory();
                Ok(factory.convert(&arg, param, self.ctx)?.unwrap_or(arg))
            }
            _ => Ok(arg),
        }
    }

    fn name(&mut self, node: &AstNode, name: &str, origin: NameOrigin) -> Result<CodeFragment> {
        let ir = match origin {
            NameOrigin::Local => Ir::Local(name.to_string()),
            NameOrigin::Input | NameOrigin::Dynamic => Ir::InputField(name.to_string()),
            NameOrigin::Function => {
                let function = self
                    .ctx
                    .function_value(name)
                    .ok_or_else(|| CompileError::unresolved(name, node.span))?;
                let index = self.ctx.intern(Value::Function(function));
                return Ok(CodeFragment::new(Ir::ConstRef(index), node.ftype.clone()).non_null());
            }
        };
        Ok(CodeFragment::new(ir, node.ftype.clone()))
    }

    fn typed_constant(&mut self, value: Value, node: &AstNode) -> CodeFragment {
        CodeFragment::typed_constant(value, node.ftype.clone(), self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;
    use crate::compiler::CompilerOptions;
    use crate::factory;
    use feel_core::ir::{EqualMode, NumericMode};
    use feel_core::Number;

    fn context(options: CompilerOptions, inputs: Vec<(&str, FType)>) -> TranslationContext {
        TranslationContext::new(
            options,
            factory::default_type_factories(),
            factory::default_function_factories(),
            FType::Any,
            inputs.into_iter().map(|(n, t)| (n.to_string(), t)).collect(),
            None,
        )
    }

    fn lower(source: &str, ctx: &mut TranslationContext) -> Result<CodeFragment> {
        let syntax = feel_parser::parse_expression(source, &ctx.known_names())?;
        let ast = AstBuilder::new(ctx, source).build_expression(&syntax)?;
        AstCompiler::new(ctx).compile(&ast)
    }

    fn lower_tests(source: &str, subject: FType) -> CodeFragment {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        ctx.replace_test_input_type(Some(subject));
        let syntax = feel_parser::parse_unary_tests(source, &ctx.known_names()).unwrap();
        let ast = AstBuilder::new(&mut ctx, source)
            .build_unary_tests(&syntax)
            .unwrap();
        AstCompiler::new(&mut ctx).compile(&ast).unwrap()
    }

    // ========== Folding Tests ==========

    #[test]
    fn test_literal_arithmetic_folds() {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        let two = lower("1 + 1", &mut ctx).unwrap();
        assert_eq!(two.constant, Some(Value::from(2)));
        assert_eq!(two.ftype, FType::INTEGER);

        let sum = lower("0.1 + 0.2", &mut ctx).unwrap();
        assert_eq!(
            sum.constant,
            Some(Value::Number(Number::parse_literal("0.3").unwrap()))
        );
    }

    #[test]
    fn test_null_operand_gives_null() {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        let null = lower("null + 1", &mut ctx).unwrap();
        assert_eq!(null.constant, Some(Value::Null));
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn test_folding_disabled() {
        let options = CompilerOptions {
            enable_constant_folding: false,
            ..CompilerOptions::default()
        };
        let mut ctx = context(options, vec![]);
        let sum = lower("1 + 1", &mut ctx).unwrap();
        assert!(matches!(sum.ir, Ir::Arith { mode: NumericMode::Native, .. }));
    }

    // ========== Operator Tests ==========

    #[test]
    fn test_dynamic_fallback_for_any() {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        let sum = lower("a + 1", &mut ctx).unwrap();
        assert!(matches!(sum.ir, Ir::Dynamic { op: InfixOp::Add, .. }));
        assert_eq!(sum.ftype, FType::Any);
    }

    #[test]
    fn test_incompatible_operands_become_null() {
        let mut ctx = context(
            CompilerOptions::default(),
            vec![("s", FType::String), ("b", FType::Boolean)],
        );
        let null = lower("s * b", &mut ctx).unwrap();
        assert_eq!(null.ir, Ir::null());
        assert_eq!(null.ftype, FType::Null);
    }

    #[test]
    fn test_identical_operands_compare_equal() {
        let mut ctx = context(CompilerOptions::default(), vec![("a", FType::INTEGER)]);
        let eq = lower("a = a", &mut ctx).unwrap();
        assert_eq!(eq.constant, Some(Value::Boolean(true)));

        let numeric = lower("a = 1.0", &mut ctx).unwrap();
        assert!(matches!(numeric.ir, Ir::Equal { mode: EqualMode::Numeric, .. }));
    }

    // ========== Iteration Tests ==========

    #[test]
    fn test_inclusive_range_domain_steps() {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        let list = lower("for i in 1..3 return i", &mut ctx).unwrap();
        match list.ir {
            Ir::For { iterators, .. } => {
                assert!(matches!(iterators[0].domain, Domain::Steps { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }

        let some = lower("some x in [1, 2, 3] satisfies x > 2", &mut ctx).unwrap();
        match some.ir {
            Ir::Quantified { iterators, .. } => {
                assert!(matches!(iterators[0].domain, Domain::Values(_)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    // ========== Unary Test Tests ==========

    #[test]
    fn test_unary_test_shapes() {
        let dash = lower_tests("-", FType::INTEGER);
        assert_eq!(dash.constant, Some(Value::Boolean(true)));

        let comparison = lower_tests("> 1", FType::INTEGER);
        assert!(matches!(comparison.ir, Ir::Compare { op: InfixOp::Gt, .. }));

        let list = lower_tests("[1, 2]", FType::INTEGER);
        assert!(matches!(list.ir, Ir::ListContains { .. }));

        let interval = lower_tests("[1..5]", FType::INTEGER);
        assert!(matches!(interval.ir, Ir::RangeContains { .. }));

        let equality = lower_tests("\"a\"", FType::String);
        assert!(matches!(equality.ir, Ir::Equal { .. }));

        let negated = lower_tests("not(1, 2)", FType::INTEGER);
        assert!(matches!(negated.ir, Ir::Not(_)));

        let dynamic = lower_tests("1", FType::Any);
        assert!(matches!(dynamic.ir, Ir::Equal { mode: EqualMode::Structural, .. }));
    }

    #[test]
    fn test_function_value_is_pooled() {
        let mut ctx = context(CompilerOptions::default(), vec![]);
        let call = lower("{f: abs, r: f(-1)}.r", &mut ctx).unwrap();
        assert_eq!(call.ftype, FType::NUMBER);
        assert!(ctx
            .constants()
            .iter()
            .any(|c| matches!(c, Value::Function(_))));
    }

    #[test]
    fn test_builtin_call_lowering() {
        let mut ctx = context(CompilerOptions::default(), vec![("s", FType::String)]);
        let call = lower("upper case(s)", &mut ctx).unwrap();
        assert!(matches!(
            call.ir,
            Ir::Call { target: CallTarget::Builtin(ref name), .. } if name == "upper case"
        ));
        let not = lower("not(true)", &mut ctx).unwrap();
        assert!(matches!(not.ir, Ir::Not(_)));
    }
}
