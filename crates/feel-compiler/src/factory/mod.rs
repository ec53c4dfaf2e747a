//! Type and function factories
//!
//! Factories are the extension points of the compiler. A type factory lowers
//! member access, operators, range stepping and conversions for the types it
//! knows; a function factory declares overload sets and lowers call sites.
//! Providers are held in an explicit ordered list with the defaults last, and
//! the composites ask each in turn until one answers.

pub mod builtins;
pub mod composite;
pub mod default_types;
pub mod infix;
pub mod native;

pub use builtins::BuiltinFunctionFactory;
pub use composite::{CompositeFunctionFactory, CompositeTypeFactory};
pub use default_types::DefaultTypeFactory;
pub use native::NativeFunctionFactory;

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{Domain, Ir};
use feel_core::types::FunctionValue;
use feel_core::{CompatRank, FType};
use indexmap::IndexMap;
use std::sync::Arc;

/// Ordered type providers
pub type TypeFactories = Arc<[Arc<dyn FeelTypeFactory>]>;

/// Ordered function providers
pub type FunctionFactories = Arc<[Arc<dyn FeelFunctionFactory>]>;

/// Lowering rules for types.
///
/// Every method answers `None` for inputs it does not handle.
pub trait FeelTypeFactory: Send + Sync {
    /// Named types visible to type references
    fn types(&self) -> Vec<(String, FType)> {
        Vec::new()
    }

    /// Lower `source.member`
    fn member(
        &self,
        _node: &AstNode,
        _source: &CodeFragment,
        _member: &str,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        Ok(None)
    }

    /// Lower a binary operator
    fn infix_op(
        &self,
        _node: &AstNode,
        _left: &CodeFragment,
        _right: &CodeFragment,
        _op: InfixOp,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        Ok(None)
    }

    /// The value `offset` steps away from `source`, for range stepping
    fn index_of(
        &self,
        _source: &CodeFragment,
        _offset: i32,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<Ir>> {
        Ok(None)
    }

    /// Loop shape for iterating a range with the given bounds
    fn foreach(
        &self,
        _start: &CodeFragment,
        _end: &CodeFragment,
        _start_inclusive: bool,
        _end_inclusive: bool,
        _element: &FType,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<Domain>> {
        Ok(None)
    }

    /// Convert a value to `target`
    fn convert(
        &self,
        _original: &CodeFragment,
        _target: &FType,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        Ok(None)
    }
}

/// Function declarations and call-site lowering
pub trait FeelFunctionFactory: Send + Sync {
    /// Overload sets by function name
    fn functions(&self) -> IndexMap<String, Vec<FType>>;

    /// Overload chosen for the argument types
    fn signature(&self, name: &str, args: &[FType]) -> Option<FType> {
        self.functions()
            .get(name)
            .and_then(|overloads| resolve_overload(overloads, args))
    }

    /// Return type of the overload chosen for the argument types
    fn return_type(&self, name: &str, args: &[FType]) -> Option<FType> {
        match self.signature(name, args)? {
            FType::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    /// Lower a call. `args` are already converted to the chosen overload.
    fn function(
        &self,
        node: &AstNode,
        name: &str,
        args: Vec<CodeFragment>,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>>;

    /// A function referenced by name as a value
    fn value(&self, _name: &str) -> Option<FunctionValue> {
        None
    }
}

/// Pick the closest overload.
///
/// Overloads are ranked by their worst argument rank, then by the sum of all
/// ranks. Overloads with an incompatible argument are never chosen.
pub fn resolve_overload(overloads: &[FType], args: &[FType]) -> Option<FType> {
    overloads
        .iter()
        .filter_map(|overload| {
            let FType::Function { params, .. } = overload else {
                return None;
            };
            if params.len() != args.len() {
                return None;
            }
            let ranks: Vec<CompatRank> = args
                .iter()
                .zip(params)
                .map(|(arg, param)| arg.can_be(param))
                .collect();
            if ranks.contains(&CompatRank::Incompatible) {
                return None;
            }
            let worst = ranks.iter().copied().max().unwrap_or(CompatRank::Equal);
            let total: usize = ranks.iter().map(|r| *r as usize).sum();
            Some(((worst, total), overload))
        })
        .min_by_key(|(score, _)| *score)
        .map(|(_, overload)| overload.clone())
}

/// The default type providers
pub fn default_type_factories() -> TypeFactories {
    Arc::from(vec![Arc::new(DefaultTypeFactory::new()) as Arc<dyn FeelTypeFactory>])
}

/// The default function providers
pub fn default_function_factories() -> FunctionFactories {
    Arc::from(vec![
        Arc::new(BuiltinFunctionFactory::new()) as Arc<dyn FeelFunctionFactory>
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_closest_overload() {
        let overloads = vec![
            FType::function(vec![("x", FType::NUMBER)], FType::NUMBER),
            FType::function(vec![("x", FType::INTEGER)], FType::INTEGER),
            FType::function(vec![("x", FType::String)], FType::String),
        ];
        let chosen = resolve_overload(&overloads, &[FType::INTEGER]).unwrap();
        assert_eq!(chosen, overloads[1]);

        let chosen = resolve_overload(&overloads, &[FType::String]).unwrap();
        assert_eq!(chosen, overloads[2]);
    }

    #[test]
    fn test_resolve_rejects_incompatible_and_arity() {
        let overloads = vec![FType::function(vec![("x", FType::NUMBER)], FType::NUMBER)];
        assert!(resolve_overload(&overloads, &[FType::Boolean]).is_none());
        assert!(resolve_overload(&overloads, &[FType::NUMBER, FType::NUMBER]).is_none());
        assert!(resolve_overload(&overloads, &[FType::Any]).is_some());
    }
}
