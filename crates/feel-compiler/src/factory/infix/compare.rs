//! `<`, `<=`, `>`, `>=`

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{CompareMode, Ir};
use feel_core::{ops, FType};

/// Ordering comparisons over comparable operand types
pub struct Compare;

impl InfixRule for Compare {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !op.is_ordering() || !op.result_type(&left.ftype, &right.ftype).is_boolean() {
            return Ok(None);
        }
        let mode = compare_mode(&left.ftype, &right.ftype);
        if let Some((l, r)) = foldable(left, right, ctx) {
            let folded = ops::compare_with_mode(op, mode, l, r);
            return Ok(Some(CodeFragment::constant(folded, ctx)));
        }

        let ir = Ir::Compare {
            op,
            mode,
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
        };
        let fragment = CodeFragment::new(ir, FType::Boolean);
        Ok(Some(if left.primitive && right.primitive {
            fragment.non_null()
        } else {
            fragment
        }))
    }
}

fn compare_mode(left: &FType, right: &FType) -> CompareMode {
    let exact = |t: &FType| *t == FType::BIG_DECIMAL || *t == FType::NUMBER;
    if !left.is_number() || !right.is_number() {
        CompareMode::Natural
    } else if exact(left) || exact(right) {
        CompareMode::Decimal
    } else {
        CompareMode::Double
    }
}
