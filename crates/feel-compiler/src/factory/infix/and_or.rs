//! Three-valued `and` / `or`

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::Ir;
use feel_core::{ops, FType, Value};

/// Boolean connectives over any operand types
pub struct AndOr;

impl InfixRule for AndOr {
    fn name(&self) -> &'static str {
        "and_or"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !op.is_and_or() {
            return Ok(None);
        }
        if let Some((l, r)) = foldable(left, right, ctx) {
            return Ok(Some(CodeFragment::constant(ops::logic(op, l, r), ctx)));
        }
        if ctx.options().enable_constant_folding {
            // A dominating constant decides the result on its own
            let dominant = Value::Boolean(op == InfixOp::Or);
            if left.constant.as_ref() == Some(&dominant) || right.constant.as_ref() == Some(&dominant)
            {
                return Ok(Some(CodeFragment::constant(dominant, ctx)));
            }
        }

        let short_circuit = is_proven_boolean(left) && is_proven_boolean(right);
        let ir = Ir::Logic {
            op,
            short_circuit,
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
        };
        let fragment = CodeFragment::new(ir, FType::Boolean);
        Ok(Some(if short_circuit {
            fragment.non_null()
        } else {
            fragment
        }))
    }
}

fn is_proven_boolean(fragment: &CodeFragment) -> bool {
    fragment.ftype.is_boolean() && !fragment.nullable
}
