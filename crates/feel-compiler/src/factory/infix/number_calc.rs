//! Numeric `+ - * / **`

use super::{foldable, InfixRule};
use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{Ir, NumericMode};
use feel_core::{ops, FType};

/// Arithmetic between two numbers
pub struct NumberCalc;

impl InfixRule for NumberCalc {
    fn name(&self) -> &'static str {
        "number_calc"
    }

    fn apply(
        &self,
        _node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !op.is_arithmetic() || !left.ftype.is_number() || !right.ftype.is_number() {
            return Ok(None);
        }
        let result = op.result_type(&left.ftype, &right.ftype);
        let exact = result == FType::BIG_DECIMAL || result == FType::NUMBER;
        let mode = if exact || op == InfixOp::Div || !ctx.options().native_arithmetic {
            NumericMode::Decimal
        } else {
            NumericMode::Native
        };

        if let Some((l, r)) = foldable(left, right, ctx) {
            let precision = ctx.options().decimal_precision;
            let folded = ops::arith_with_precision(op, l, r, mode, precision);
            return Ok(Some(CodeFragment::typed_constant(folded, result, ctx)));
        }

        let null_check = left.nullable || right.nullable;
        let ir = Ir::Arith {
            op,
            mode,
            left: left.ir.clone().boxed(),
            right: right.ir.clone().boxed(),
            null_check,
        };
        // Division by zero is null even for non-null operands
        let nullable = null_check || op == InfixOp::Div || op == InfixOp::Pow;
        Ok(Some(CodeFragment::new(ir, result).with_nullable(nullable)))
    }
}
