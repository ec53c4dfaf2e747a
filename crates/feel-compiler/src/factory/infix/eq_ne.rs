//! `=` and `!=`

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{EqualMode, Ir};
use feel_core::{ops, FType, Value};

/// Equality over any pair of types
pub struct EqNe;

impl InfixRule for EqNe {
    fn name(&self) -> &'static str {
        "eq_ne"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !op.is_eq_ne() {
            return Ok(None);
        }
        let negated = op == InfixOp::Ne;

        // Identical expressions are equal, null included
        if left.ir == right.ir && ctx.options().enable_constant_folding {
            return Ok(Some(CodeFragment::constant(Value::Boolean(!negated), ctx)));
        }
        if let Some((l, r)) = foldable(left, right, ctx) {
            let folded = ops::equality(l, r, negated);
            return Ok(Some(CodeFragment::constant(folded, ctx)));
        }

        let mode = equal_mode(left, right);
        let ir = Ir::Equal {
            mode,
            negated,
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
        };
        Ok(Some(CodeFragment::new(ir, FType::Boolean).non_null()))
    }
}

fn equal_mode(left: &CodeFragment, right: &CodeFragment) -> EqualMode {
    let same_primitive = left.primitive
        && right.primitive
        && (left.ftype == right.ftype
            || (left.ftype.is_number() && right.ftype.is_number()));
    if same_primitive {
        EqualMode::Primitive
    } else if left.ftype.is_number() && right.ftype.is_number() {
        EqualMode::Numeric
    } else {
        EqualMode::Structural
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, input, node};
    use super::*;

    #[test]
    fn test_identical_operands_fold() {
        let mut ctx = context();
        let a = input("a", FType::Any);
        let eq = EqNe.apply(&node(), &a, &a, InfixOp::Eq, &mut ctx).unwrap().unwrap();
        assert_eq!(eq.constant, Some(Value::Boolean(true)));
        let ne = EqNe.apply(&node(), &a, &a, InfixOp::Ne, &mut ctx).unwrap().unwrap();
        assert_eq!(ne.constant, Some(Value::Boolean(false)));
    }

    #[test]
    fn test_modes() {
        let mut ctx = context();
        let a = input("a", FType::INTEGER);
        let b = input("b", FType::DOUBLE);
        let s = input("s", FType::String);

        let numeric = EqNe.apply(&node(), &a, &b, InfixOp::Eq, &mut ctx).unwrap().unwrap();
        assert!(matches!(numeric.ir, Ir::Equal { mode: EqualMode::Numeric, .. }));
        assert!(!numeric.nullable);

        let structural = EqNe.apply(&node(), &a, &s, InfixOp::Ne, &mut ctx).unwrap().unwrap();
        assert!(matches!(
            structural.ir,
            Ir::Equal { mode: EqualMode::Structural, negated: true, .. }
        ));

        let x = a.clone().non_null();
        let y = input("y", FType::LONG).non_null();
        let primitive = EqNe.apply(&node(), &x, &y, InfixOp::Eq, &mut ctx).unwrap().unwrap();
        assert!(matches!(primitive.ir, Ir::Equal { mode: EqualMode::Primitive, .. }));
    }

    #[test]
    fn test_other_operators_are_ignored() {
        let mut ctx = context();
        let a = input("a", FType::INTEGER);
        assert!(EqNe.apply(&node(), &a, &a, InfixOp::Lt, &mut ctx).unwrap().is_none());
    }
}
