//! Date, time and duration arithmetic

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::Ir;
use feel_core::ops;

pub struct TemporalCalc;

impl InfixRule for TemporalCalc {
    fn name(&self) -> &'static str {
        "temporal_calc"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !op.is_arithmetic() || !(left.ftype.is_temporal() || right.ftype.is_temporal()) {
            return Ok(None);
        }
        let result = op.result_type(&left.ftype, &right.ftype);
        if result.is_null() || result.is_any() {
            return Ok(None);
        }
        if let Some((l, r)) = foldable(left, right, ctx) {
            let folded = ops::temporal(op, l, r);
            return Ok(Some(CodeFragment::typed_constant(folded, result, ctx)));
        }
        let ir = Ir::Temporal {
            op,
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
        };
        Ok(Some(CodeFragment::new(ir, result)))
    }
}
