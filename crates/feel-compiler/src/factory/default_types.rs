//! Default type factory
//!
//! Lowers member access, operators, range stepping and conversions for the
//! built-in FEEL types.

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use crate::factory::infix::{default_rules, InfixRule};
use crate::factory::FeelTypeFactory;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{Domain, Ir, NumericMode};
use feel_core::{CompatRank, FType, Number, Value};
use tracing::trace;

/// Type factory for the built-in types
pub struct DefaultTypeFactory {
    rules: Vec<Box<dyn InfixRule>>,
}

impl DefaultTypeFactory {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Factory with a custom operator rule chain
    pub fn with_rules(rules: Vec<Box<dyn InfixRule>>) -> Self {
        Self { rules }
    }
}

impl Default for DefaultTypeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FeelTypeFactory for DefaultTypeFactory {
    fn member(
        &self,
        _node: &AstNode,
        source: &CodeFragment,
        member: &str,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        let Some(ftype) = source.ftype.member_type(member) else {
            return Ok(None);
        };
        let ir = Ir::Member {
            source: source.ir.clone().boxed(),
            name: member.to_string(),
        };
        Ok(Some(CodeFragment::new(ir, ftype)))
    }

    fn infix_op(
        &self,
        node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        for rule in &self.rules {
            if let Some(fragment) = rule.apply(node, left, right, op, ctx)? {
                trace!(rule = rule.name(), op = %op, "lowered operator");
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }

    fn index_of(
        &self,
        source: &CodeFragment,
        offset: i32,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<Ir>> {
        let ir = match &source.ftype {
            FType::Number(_) => {
                let exact = source.ftype == FType::BIG_DECIMAL || source.ftype == FType::NUMBER;
                Ir::Arith {
                    op: InfixOp::Add,
                    mode: if exact {
                        NumericMode::Decimal
                    } else {
                        NumericMode::Native
                    },
                    left: source.ir.clone().boxed(),
                    right: Ir::Const(Value::Number(Number::Integer(offset))).boxed(),
                    null_check: source.nullable,
                }
            }
            FType::Date | FType::DateTime => Ir::Temporal {
                op: InfixOp::Add,
                left: source.ir.clone().boxed(),
                right: Ir::Const(Value::DayTimeDuration(chrono::Duration::days(offset.into())))
                    .boxed(),
            },
            _ => return Ok(None),
        };
        Ok(Some(ir))
    }

    fn foreach(
        &self,
        start: &CodeFragment,
        end: &CodeFragment,
        start_inclusive: bool,
        end_inclusive: bool,
        element: &FType,
        ctx: &mut TranslationContext,
    ) -> Result<Option<Domain>> {
        if !(start_inclusive && end_inclusive) {
            return Ok(None);
        }
        if !(element.is_number() || *element == FType::Date) {
            return Ok(None);
        }
        let cursor = ctx.fresh_local("cursor");
        let current = CodeFragment::local(cursor.clone(), element.clone()).non_null();
        let factory = ctx.type_factory();
        let (Some(successor), Some(predecessor)) = (
            factory.index_of(&current, 1, ctx)?,
            factory.index_of(&current, -1, ctx)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Domain::Steps {
            first: start.ir.clone(),
            last: end.ir.clone(),
            cursor,
            successor,
            predecessor,
        }))
    }

    fn convert(
        &self,
        original: &CodeFragment,
        target: &FType,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        let converted = match original.ftype.can_be(target) {
            CompatRank::Equal | CompatRank::Conforms => original.clone(),
            CompatRank::Incompatible => return Ok(None),
            _ if widens_elements(&original.ftype, target) => original.clone(),
            _ => {
                let ir = Ir::Convert {
                    value: original.ir.clone().boxed(),
                    target: target.clone(),
                };
                CodeFragment::new(ir, target.clone())
            }
        };
        Ok(Some(converted))
    }
}

/// Containers whose elements only widen need no runtime conversion
fn widens_elements(source: &FType, target: &FType) -> bool {
    match (source, target) {
        (FType::List(a), FType::List(b)) => a.conforms_to(b) || widens_elements(a, b),
        _ => false,
    }
}
