//! String `+`

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::Ir;
use feel_core::{ops, FType};

/// Concatenation when either operand is a string
pub struct StringAdd;

impl InfixRule for StringAdd {
    fn name(&self) -> &'static str {
        "string_add"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if op != InfixOp::Add || op.result_type(&left.ftype, &right.ftype) != FType::String {
            return Ok(None);
        }
        if let Some((l, r)) = foldable(left, right, ctx) {
            let folded = ops::concat(l, r);
            return Ok(Some(CodeFragment::typed_constant(folded, FType::String, ctx)));
        }
        let ir = Ir::Concat {
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
        };
        let nullable = left.nullable || right.nullable;
        Ok(Some(CodeFragment::new(ir, FType::String).with_nullable(nullable)))
    }
}
