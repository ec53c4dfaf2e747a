//! Default binary operator rules
//!
//! The default type factory tries these in order; the first rule that
//! handles an operator and its operand types lowers it.

mod and_or;
mod compare;
mod eq_ne;
mod number_calc;
mod string_add;
mod temporal_calc;

pub use and_or::AndOr;
pub use compare::Compare;
pub use eq_ne::EqNe;
pub use number_calc::NumberCalc;
pub use string_add::StringAdd;
pub use temporal_calc::TemporalCalc;

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::Value;

/// One lowering rule for binary operators
pub trait InfixRule: Send + Sync {
    /// Rule name, for tracing
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>>;
}

/// The default chain: EqNe, AndOr, Compare, NumberCalc, StringAdd, TemporalCalc
pub fn default_rules() -> Vec<Box<dyn InfixRule>> {
    vec![
        Box::new(EqNe),
        Box::new(AndOr),
        Box::new(Compare),
        Box::new(NumberCalc),
        Box::new(StringAdd),
        Box::new(TemporalCalc),
    ]
}

/// Both operand values, when both are constants and folding is enabled
fn foldable<'a>(
    left: &'a CodeFragment,
    right: &'a CodeFragment,
    ctx: &TranslationContext,
) -> Option<(&'a Value, &'a Value)> {
    if !ctx.options().enable_constant_folding {
        return None;
    }
    Some((left.constant.as_ref()?, right.constant.as_ref()?))
}
