//! Parse tree to AST
//!
//! The builder resolves names against the translation context, resolves type
//! references, and assigns every node its static type. Operator combinations
//! that can only produce null are kept but flagged with a warning.

pub mod types;

use crate::context::TranslationContext;
use crate::error::{CompileError, Result};
use crate::factory::FeelFunctionFactory;
use feel_core::ast::{
    AstNode, Callee, ContextEntry, FilterKind, InfixOp, Iteration, NameOrigin, NodeKind,
};
use feel_core::types::temporal::parse_temporal;
use feel_core::{FType, Number, SourceSpan};
use feel_parser::{Arguments, IterationSyntax, Syntax, SyntaxKind, TypeRef};

/// Builds typed AST nodes from parse trees
pub struct AstBuilder<'a> {
    ctx: &'a mut TranslationContext,
    source: &'a str,
}

impl<'a> AstBuilder<'a> {
    pub fn new(ctx: &'a mut TranslationContext, source: &'a str) -> Self {
        Self { ctx, source }
    }

    /// Build an expression tree
    pub fn build_expression(&mut self, syntax: &Syntax) -> Result<AstNode> {
        self.build(syntax)
    }

    /// Build the root of a unary-test list. The result is always a `UnaryTests` node.
    pub fn build_unary_tests(&mut self, syntax: &Syntax) -> Result<AstNode> {
        let (negated, tests) = match &syntax.kind {
            SyntaxKind::UnaryTests { negated, tests } => (*negated, tests.as_slice()),
            _ => (false, std::slice::from_ref(syntax)),
        };
        let tests = tests
            .iter()
            .map(|test| self.build_positive_test(test))
            .collect::<Result<Vec<_>>>()?;
        let node = AstNode::new(
            NodeKind::UnaryTests { negated, tests },
            FType::Boolean,
            syntax.span,
        );
        Ok(node.with_comments(syntax.comments.clone()))
    }

    fn build_positive_test(&mut self, syntax: &Syntax) -> Result<AstNode> {
        let node = match &syntax.kind {
            SyntaxKind::Dash => AstNode::new(NodeKind::Dash, FType::Boolean, syntax.span),
            SyntaxKind::UnaryComparison { op, value } => {
                let value = self.build(value)?;
                let subject = self.test_input_type(syntax.span)?;
                let node = AstNode::new(
                    NodeKind::UnaryComparison {
                        op: *op,
                        value: Box::new(value.clone()),
                    },
                    FType::Boolean,
                    syntax.span,
                );
                match self.null_warning(*op, &subject, &value.ftype, syntax.span) {
                    Some(warning) => node.with_warning(warning),
                    None => node,
                }
            }
            _ => return self.build(syntax),
        };
        Ok(node.with_comments(syntax.comments.clone()))
    }

    fn build(&mut self, syntax: &Syntax) -> Result<AstNode> {
        let span = syntax.span;
        let node = match &syntax.kind {
            SyntaxKind::Null => AstNode::new(NodeKind::Null, FType::Null, span),
            SyntaxKind::Boolean(b) => AstNode::new(NodeKind::Boolean(*b), FType::Boolean, span),
            SyntaxKind::Number(text) => {
                let number = parse_number(text).ok_or_else(|| {
                    CompileError::translation(format!("invalid number '{}'", text), span, &[])
                })?;
                let ftype = FType::Number(number.kind());
                AstNode::new(NodeKind::Number(number), ftype, span)
            }
            SyntaxKind::String(s) => AstNode::new(NodeKind::String(s.clone()), FType::String, span),
            SyntaxKind::Temporal(text) => {
                let value = parse_temporal(text).ok_or_else(|| {
                    CompileError::translation(
                        format!("invalid temporal literal @\"{}\"", text),
                        span,
                        &[],
                    )
                })?;
                let ftype = FType::of_value(&value);
                AstNode::new(NodeKind::Temporal(value), ftype, span)
            }

            SyntaxKind::Name(name) => {
                let symbol = self
                    .ctx
                    .resolve(name)
                    .ok_or_else(|| CompileError::unresolved(name, span))?;
                AstNode::new(
                    NodeKind::Name {
                        name: name.clone(),
                        origin: symbol.origin,
                    },
                    symbol.ftype,
                    span,
                )
            }
            SyntaxKind::TestInput => {
                let ftype = self.test_input_type(span)?;
                AstNode::new(NodeKind::TestInput, ftype, span)
            }
            SyntaxKind::Dash | SyntaxKind::UnaryComparison { .. } => {
                return self.build_positive_test(syntax)
            }
            SyntaxKind::UnaryTests { .. } => return self.build_unary_tests(syntax),

            SyntaxKind::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.build(item))
                    .collect::<Result<Vec<_>>>()?;
                let element = common_type(items.iter().map(|i| &i.ftype));
                AstNode::new(NodeKind::List(items), FType::list(element), span)
            }
            SyntaxKind::Context(entries) => self.build_context(entries, span)?,
            SyntaxKind::Interval {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => {
                let start = self.build(start)?;
                let end = self.build(end)?;
                self.range_node(start, end, *start_inclusive, *end_inclusive, span)
            }

            SyntaxKind::Binary { op, left, right } => {
                let left = self.build(left)?;
                let right = self.build(right)?;
                let ftype = op.result_type(&left.ftype, &right.ftype);
                let warning = self.null_warning(*op, &left.ftype, &right.ftype, span);
                let node = AstNode::new(
                    NodeKind::Infix {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ftype,
                    span,
                );
                match warning {
                    Some(warning) => node.with_warning(warning),
                    None => node,
                }
            }
            SyntaxKind::Negation(operand) => {
                let operand = self.build(operand)?;
                let ftype = match &operand.ftype {
                    t @ (FType::Any
                    | FType::Number(_)
                    | FType::DayTimeDuration
                    | FType::YearMonthDuration) => t.clone(),
                    _ => FType::Null,
                };
                let warning = (ftype.is_null() && !operand.ftype.is_null())
                    .then(|| format!("negation of {} is always null", operand.ftype));
                let node = AstNode::new(NodeKind::Negation(Box::new(operand)), ftype, span);
                match warning {
                    Some(warning) => node.with_warning(warning),
                    None => node,
                }
            }
            SyntaxKind::Between { value, low, high } => {
                let kind = NodeKind::Between {
                    value: Box::new(self.build(value)?),
                    low: Box::new(self.build(low)?),
                    high: Box::new(self.build(high)?),
                };
                AstNode::new(kind, FType::Boolean, span)
            }
            SyntaxKind::In { value, tests } => {
                let value = self.build(value)?;
                let previous = self.ctx.replace_test_input_type(Some(value.ftype.clone()));
                let built = tests
                    .iter()
                    .map(|test| self.build_positive_test(test))
                    .collect::<Result<Vec<_>>>();
                self.ctx.replace_test_input_type(previous);
                let tests_span = tests
                    .iter()
                    .map(|t| t.span)
                    .reduce(|a, b| a.merge(&b))
                    .unwrap_or(span);
                let tests = AstNode::new(
                    NodeKind::UnaryTests {
                        negated: false,
                        tests: built?,
                    },
                    FType::Boolean,
                    tests_span,
                );
                let kind = NodeKind::In {
                    value: Box::new(value),
                    tests: Box::new(tests),
                };
                AstNode::new(kind, FType::Boolean, span)
            }
            SyntaxKind::InstanceOf { value, target } => {
                let value = self.build(value)?;
                let target = self.resolve_type(target, span)?;
                let kind = NodeKind::InstanceOf {
                    value: Box::new(value),
                    target,
                };
                AstNode::new(kind, FType::Boolean, span)
            }

            SyntaxKind::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.build(condition)?;
                let then = self.build(then)?;
                let otherwise = self.build(otherwise)?;
                let ftype = then.ftype.min_super(&otherwise.ftype);
                let kind = NodeKind::If {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                };
                AstNode::new(kind, ftype, span)
            }
            SyntaxKind::For { iterators, body } => {
                self.ctx.push_scope();
                let built = self.build_iterations(iterators).and_then(|iterators| {
                    let body = self.build(body)?;
                    Ok((iterators, body))
                });
                self.ctx.pop_scope();
                let (iterators, body) = built?;
                let ftype = FType::list(body.ftype.clone());
                let kind = NodeKind::For {
                    iterators,
                    body: Box::new(body),
                };
                AstNode::new(kind, ftype, span)
            }
            SyntaxKind::Quantified {
                every,
                iterators,
                condition,
            } => {
                self.ctx.push_scope();
                let built = self.build_iterations(iterators).and_then(|iterators| {
                    let condition = self.build(condition)?;
                    Ok((iterators, condition))
                });
                self.ctx.pop_scope();
                let (iterators, condition) = built?;
                let kind = NodeKind::Quantified {
                    every: *every,
                    iterators,
                    condition: Box::new(condition),
                };
                AstNode::new(kind, FType::Boolean, span)
            }
            SyntaxKind::Filter { source, filter } => self.build_filter(source, filter, span)?,
            SyntaxKind::FunctionDefinition { params, body } => {
                self.build_function_definition(params, body, span)?
            }
            SyntaxKind::Invocation { callee, args } => self.build_invocation(callee, args, span)?,
            SyntaxKind::Path { source, member } => {
                let source = self.build(source)?;
                let ftype = source
                    .ftype
                    .member_type(member)
                    .ok_or_else(|| CompileError::unresolved(member, span))?;
                let kind = NodeKind::Path {
                    source: Box::new(source),
                    member: member.clone(),
                };
                AstNode::new(kind, ftype, span)
            }
        };
        Ok(node.with_comments(syntax.comments.clone()))
    }

    // === Structural ===

    fn build_context(&mut self, entries: &[(String, Syntax)], span: SourceSpan) -> Result<AstNode> {
        self.ctx.push_scope();
        let mut built = Vec::with_capacity(entries.len());
        let mut failure = None;
        for (name, value) in entries {
            match self.build(value) {
                Ok(value) => {
                    self.ctx.declare(name.clone(), value.ftype.clone());
                    built.push(ContextEntry {
                        name: name.clone(),
                        value,
                    });
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.ctx.pop_scope();
        if let Some(err) = failure {
            return Err(err);
        }
        let fields = built
            .iter()
            .map(|e| (e.name.clone(), e.value.ftype.clone()))
            .collect();
        Ok(AstNode::new(
            NodeKind::Context(built),
            FType::Context(fields),
            span,
        ))
    }

    fn range_node(
        &self,
        start: AstNode,
        end: AstNode,
        start_inclusive: bool,
        end_inclusive: bool,
        span: SourceSpan,
    ) -> AstNode {
        let ftype = FType::Range {
            element: Box::new(start.ftype.min_super(&end.ftype)),
            start_inclusive: Some(start_inclusive),
            end_inclusive: Some(end_inclusive),
        };
        let kind = NodeKind::Range {
            start: Some(Box::new(start)),
            end: Some(Box::new(end)),
            start_inclusive,
            end_inclusive,
        };
        AstNode::new(kind, ftype, span)
    }

    /// Build iteration domains in order, declaring each name for the ones after it.
    /// The caller owns the scope.
    fn build_iterations(&mut self, iterators: &[IterationSyntax]) -> Result<Vec<Iteration>> {
        let mut built = Vec::with_capacity(iterators.len());
        for iterator in iterators {
            let domain = self.build(&iterator.domain)?;
            let domain = match &iterator.end {
                Some(end) => {
                    let end = self.build(end)?;
                    let span = domain.span.merge(&end.span);
                    self.range_node(domain, end, true, true, span)
                }
                None => domain,
            };
            self.ctx
                .declare(iterator.name.clone(), domain.ftype.element_type());
            built.push(Iteration {
                name: iterator.name.clone(),
                domain,
            });
        }
        Ok(built)
    }

    fn build_filter(&mut self, source: &Syntax, filter: &Syntax, span: SourceSpan) -> Result<AstNode> {
        let source = self.build(source)?;
        let element = source.ftype.element_type();

        match &element {
            FType::Context(fields) => {
                self.ctx.push_scope();
                for (name, ftype) in fields {
                    self.ctx.declare(name.clone(), ftype.clone());
                }
            }
            _ => self.ctx.push_open_scope(),
        }
        self.ctx.declare("item", element.clone());
        let filter = self.build(filter);
        self.ctx.pop_scope();
        let filter = filter?;

        let (kind, ftype) = match &filter.ftype {
            FType::Number(_) => (FilterKind::Index, element),
            FType::Any => (FilterKind::Dynamic, FType::Any),
            _ => (FilterKind::Predicate, FType::list(element)),
        };
        let node_kind = NodeKind::Filter {
            source: Box::new(source),
            filter: Box::new(filter),
            kind,
        };
        Ok(AstNode::new(node_kind, ftype, span))
    }

    fn build_function_definition(
        &mut self,
        params: &[(String, Option<TypeRef>)],
        body: &Syntax,
        span: SourceSpan,
    ) -> Result<AstNode> {
        let mut typed = Vec::with_capacity(params.len());
        for (name, annotation) in params {
            let ftype = match annotation {
                Some(type_ref) => self.resolve_type(type_ref, span)?,
                None => FType::Any,
            };
            typed.push((name.clone(), ftype));
        }

        self.ctx.push_scope();
        for (name, ftype) in &typed {
            self.ctx.declare(name.clone(), ftype.clone());
        }
        let body = self.build(body);
        self.ctx.pop_scope();
        let body = body?;

        let ftype = FType::function(typed.clone(), body.ftype.clone());
        let kind = NodeKind::FunctionDefinition {
            params: typed,
            body: Box::new(body),
        };
        Ok(AstNode::new(kind, ftype, span))
    }

    // === Invocation ===

    fn build_invocation(
        &mut self,
        callee: &Syntax,
        args: &Arguments,
        span: SourceSpan,
    ) -> Result<AstNode> {
        let (names, args) = match args {
            Arguments::Positional(args) => (None, args.iter().collect::<Vec<_>>()),
            Arguments::Named(args) => (
                Some(args.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>()),
                args.iter().map(|(_, a)| a).collect(),
            ),
        };
        let args = args
            .into_iter()
            .map(|arg| self.build(arg))
            .collect::<Result<Vec<_>>>()?;

        if let SyntaxKind::Name(name) = &callee.kind {
            let functions = self.ctx.function_factory();
            let overloads = functions.functions().get(name.as_str()).cloned();
            if let (Some(overloads), false) = (overloads, self.ctx.is_local(name)) {
                let args = match &names {
                    Some(names) => reorder_named(name, &overloads, names, args, span)?,
                    None => args,
                };
                let arg_types: Vec<FType> = args.iter().map(|a| a.ftype.clone()).collect();
                let signature = match functions.signature(name, &arg_types) {
                    Some(signature) => signature,
                    None if arg_types.iter().any(FType::is_any) => {
                        FType::anonymous_function(arg_types, FType::Any)
                    }
                    None => {
                        let rendered: Vec<String> =
                            arg_types.iter().map(ToString::to_string).collect();
                        return Err(CompileError::translation(
                            format!(
                                "no overload of '{}' accepts ({})",
                                name,
                                rendered.join(", ")
                            ),
                            span,
                            &[],
                        ));
                    }
                };
                let ftype = match &signature {
                    FType::Function { ret, .. } => (**ret).clone(),
                    _ => FType::Any,
                };
                let kind = NodeKind::Invocation {
                    callee: Callee::Named {
                        name: name.clone(),
                        signature,
                    },
                    args,
                    names: None,
                };
                return Ok(AstNode::new(kind, ftype, span));
            }
        }

        let callee = self.build(callee)?;
        // No provider knows the name and nothing in scope binds it
        if let NodeKind::Name {
            name,
            origin: NameOrigin::Dynamic,
        } = &callee.kind
        {
            return Err(CompileError::unresolved(name, span));
        }
        let ftype = match &callee.ftype {
            FType::Function { ret, .. } => (**ret).clone(),
            FType::Any => FType::Any,
            other => {
                let text = callee.span.text(self.source).unwrap_or_default();
                return Err(CompileError::translation(
                    format!("'{}' of type {} is not a function", text, other),
                    span,
                    &[],
                ));
            }
        };
        let kind = NodeKind::Invocation {
            callee: Callee::Value(Box::new(callee)),
            args,
            names,
        };
        Ok(AstNode::new(kind, ftype, span))
    }

    // === Helpers ===

    fn test_input_type(&self, span: SourceSpan) -> Result<FType> {
        self.ctx
            .test_input_type()
            .cloned()
            .ok_or_else(|| CompileError::unresolved("?", span))
    }

    fn resolve_type(&self, type_ref: &TypeRef, span: SourceSpan) -> Result<FType> {
        types::resolve_type(self.ctx, type_ref).ok_or_else(|| {
            let name = types::unknown_name(self.ctx, type_ref).unwrap_or_default();
            CompileError::unresolved(name, span)
        })
    }

    /// Warning for operator combinations that can only ever be null
    fn null_warning(
        &self,
        op: InfixOp,
        left: &FType,
        right: &FType,
        span: SourceSpan,
    ) -> Option<String> {
        if left.is_null() || right.is_null() || !op.result_type(left, right).is_null() {
            return None;
        }
        let text = span.text(self.source).unwrap_or_default();
        Some(format!(
            "operator '{}' is not defined for {} and {} in '{}'; the result is always null",
            op, left, right, text
        ))
    }
}

/// Literal text to a number, keeping the narrowest representation for negatives
fn parse_number(text: &str) -> Option<Number> {
    match text.strip_prefix('-') {
        Some(magnitude) => Number::parse_literal(magnitude).map(|n| n.neg()),
        None => Number::parse_literal(text),
    }
}

/// Least common supertype of all, `Any` for none
fn common_type<'t>(mut types: impl Iterator<Item = &'t FType>) -> FType {
    match types.next() {
        Some(first) => types.fold(first.clone(), |acc, t| acc.min_super(t)),
        None => FType::Any,
    }
}

/// Order named arguments by the parameter names of the first overload that
/// declares them all. Missing parameters are null.
fn reorder_named(
    function: &str,
    overloads: &[FType],
    names: &[String],
    args: Vec<AstNode>,
    span: SourceSpan,
) -> Result<Vec<AstNode>> {
    let params = overloads
        .iter()
        .filter_map(|overload| match overload {
            FType::Function {
                names: Some(params),
                ..
            } => Some(params),
            _ => None,
        })
        .filter(|params| names.iter().all(|n| params.contains(n)))
        .min_by_key(|params| params.len())
        .ok_or_else(|| {
            CompileError::translation(
                format!(
                    "no overload of '{}' has parameters ({})",
                    function,
                    names.join(", ")
                ),
                span,
                &[],
            )
        })?;

    let mut args: Vec<Option<AstNode>> = args.into_iter().map(Some).collect();
    let ordered = params
        .iter()
        .map(|param| {
            names
                .iter()
                .position(|n| n == param)
                .and_then(|i| args[i].take())
                .unwrap_or_else(|| AstNode::new(NodeKind::Null, FType::Null, span))
        })
        .collect();
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::infix::test_support::context;
    use indexmap::IndexMap;
    use std::collections::HashSet;

    fn build(source: &str, ctx: &mut TranslationContext) -> Result<AstNode> {
        let syntax = feel_parser::parse_expression(source, &ctx.known_names())?;
        AstBuilder::new(ctx, source).build_expression(&syntax)
    }

    fn typed_context(inputs: Vec<(&str, FType)>) -> TranslationContext {
        let inputs: IndexMap<String, FType> =
            inputs.into_iter().map(|(n, t)| (n.to_string(), t)).collect();
        TranslationContext::new(
            crate::compiler::CompilerOptions::default(),
            crate::factory::default_type_factories(),
            crate::factory::default_function_factories(),
            FType::Context(Vec::new()),
            inputs,
            None,
        )
    }

    // ========== Literal Tests ==========

    #[test]
    fn test_literals() {
        let mut ctx = context();
        assert_eq!(build("1", &mut ctx).unwrap().ftype, FType::INTEGER);
        assert_eq!(build("-1", &mut ctx).unwrap().ftype, FType::INTEGER);
        assert_eq!(build("1.5", &mut ctx).unwrap().ftype, FType::BIG_DECIMAL);
        assert_eq!(build("\"a\"", &mut ctx).unwrap().ftype, FType::String);
        assert_eq!(build("@\"2024-04-11\"", &mut ctx).unwrap().ftype, FType::Date);
        assert_eq!(build("@\"P1Y2M\"", &mut ctx).unwrap().ftype, FType::YearMonthDuration);
        assert!(matches!(
            build("@\"not a date\"", &mut ctx),
            Err(CompileError::Translation { .. })
        ));
    }

    #[test]
    fn test_list_and_context_types() {
        let mut ctx = context();
        assert_eq!(build("[]", &mut ctx).unwrap().ftype, FType::list(FType::Any));
        assert_eq!(build("[1, 2.5]", &mut ctx).unwrap().ftype, FType::list(FType::NUMBER));
        let node = build("{a: 1, b: a + 1}", &mut ctx).unwrap();
        assert_eq!(
            node.ftype,
            FType::context(vec![("a", FType::INTEGER), ("b", FType::INTEGER)])
        );
    }

    // ========== Name Resolution Tests ==========

    #[test]
    fn test_names_resolve_against_inputs() {
        let mut ctx = typed_context(vec![("a", FType::INTEGER)]);
        let node = build("a + 1", &mut ctx).unwrap();
        assert_eq!(node.ftype, FType::INTEGER);

        let err = build("b + 1", &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_any_input_resolves_dynamically() {
        let mut ctx = context();
        let node = build("x", &mut ctx).unwrap();
        assert!(matches!(
            node.kind,
            NodeKind::Name { origin: NameOrigin::Dynamic, .. }
        ));
        assert_eq!(node.ftype, FType::Any);
    }

    #[test]
    fn test_unknown_function_is_unresolved_even_on_any_input() {
        let mut ctx = context();
        let err = build("nope(1)", &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "nope"));

        let node = build("{f: function(x) x + 1, r: f(2)}", &mut ctx).unwrap();
        assert!(matches!(node.ftype, FType::Context(_)));
    }

    #[test]
    fn test_test_input_requires_a_type() {
        let mut ctx = context();
        let syntax = feel_parser::parse_unary_tests("? > 1", &HashSet::new()).unwrap();
        let err = AstBuilder::new(&mut ctx, "? > 1")
            .build_unary_tests(&syntax)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "?"));
    }

    // ========== Operator Tests ==========

    #[test]
    fn test_null_only_combination_warns() {
        let mut ctx = typed_context(vec![("s", FType::String), ("b", FType::Boolean)]);
        let node = build("s - b", &mut ctx).unwrap();
        assert_eq!(node.ftype, FType::Null);
        assert_eq!(node.collect_warnings().len(), 1);

        let node = build("null + 1", &mut ctx).unwrap();
        assert!(node.collect_warnings().is_empty());
    }

    #[test]
    fn test_in_uses_value_as_test_input() {
        let mut ctx = typed_context(vec![("x", FType::INTEGER)]);
        let node = build("x in (< 3, [5..10])", &mut ctx).unwrap();
        match node.kind {
            NodeKind::In { tests, .. } => match tests.kind {
                NodeKind::UnaryTests { tests, .. } => assert_eq!(tests.len(), 2),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.test_input_type().is_none());
    }

    // ========== Iteration and Filter Tests ==========

    #[test]
    fn test_for_declares_iteration_names() {
        let mut ctx = context();
        let node = build("for i in 1..3 return i * 2", &mut ctx).unwrap();
        assert_eq!(node.ftype, FType::list(FType::INTEGER));
        assert!(!ctx.is_local("i"));
    }

    #[test]
    fn test_filter_kinds() {
        let mut ctx = context();
        let index = build("[1, 2, 3][1]", &mut ctx).unwrap();
        assert!(matches!(index.kind, NodeKind::Filter { kind: FilterKind::Index, .. }));
        assert_eq!(index.ftype, FType::INTEGER);

        let predicate = build("[1, 2, 3][item > 1]", &mut ctx).unwrap();
        assert!(matches!(
            predicate.kind,
            NodeKind::Filter { kind: FilterKind::Predicate, .. }
        ));
        assert_eq!(predicate.ftype, FType::list(FType::INTEGER));

        let fields = build("[{a: 1}, {a: 2}][a > 1]", &mut ctx).unwrap();
        assert_eq!(
            fields.ftype,
            FType::list(FType::context(vec![("a", FType::INTEGER)]))
        );
    }

    // ========== Function Tests ==========

    #[test]
    fn test_builtin_invocation() {
        let mut ctx = context();
        let node = build("string length(\"abc\")", &mut ctx).unwrap();
        assert_eq!(node.ftype, FType::INTEGER);
        assert!(matches!(
            node.kind,
            NodeKind::Invocation { callee: Callee::Named { .. }, .. }
        ));
    }

    #[test]
    fn test_named_arguments_are_reordered() {
        let mut ctx = context();
        let node = build("substring(start position: 2, string: \"abc\")", &mut ctx).unwrap();
        match node.kind {
            NodeKind::Invocation { args, names, .. } => {
                assert!(names.is_none());
                assert!(matches!(args[0].kind, NodeKind::String(_)));
                assert!(matches!(args[1].kind, NodeKind::Number(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_overload_is_an_error() {
        let mut ctx = context();
        let err = build("string length(true)", &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::Translation { .. }));
    }

    #[test]
    fn test_user_function_in_context() {
        let mut ctx = context();
        let node = build("{f: function(a: number, b) a + b, r: f(1, 2)}", &mut ctx).unwrap();
        assert_eq!(node.ftype.field_type("r"), Some(&FType::Any));
    }

    #[test]
    fn test_instance_of_unknown_type() {
        let mut ctx = context();
        let err = build("1 instance of money", &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "money"));
    }
}
