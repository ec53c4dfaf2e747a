//! Composite factories
//!
//! Each composite asks its providers in order; the first `Some` wins.

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use crate::factory::{FeelFunctionFactory, FeelTypeFactory, FunctionFactories, TypeFactories};
use feel_core::ast::{AstNode, InfixOp};
use feel_core::ir::{Domain, Ir};
use feel_core::types::FunctionValue;
use feel_core::FType;
use indexmap::IndexMap;

/// All type providers as one factory
#[derive(Clone)]
pub struct CompositeTypeFactory {
    providers: TypeFactories,
}

impl CompositeTypeFactory {
    pub fn new(providers: TypeFactories) -> Self {
        Self { providers }
    }
}

impl FeelTypeFactory for CompositeTypeFactory {
    fn types(&self) -> Vec<(String, FType)> {
        let mut types: Vec<(String, FType)> = Vec::new();
        for provider in self.providers.iter() {
            for (name, ftype) in provider.types() {
                if !types.iter().any(|(n, _)| *n == name) {
                    types.push((name, ftype));
                }
            }
        }
        types
    }

    fn member(
        &self,
        node: &AstNode,
        source: &CodeFragment,
        member: &str,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        for provider in self.providers.iter() {
            if let Some(fragment) = provider.member(node, source, member, ctx)? {
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }

    fn infix_op(
        &self,
        node: &AstNode,
        left: &CodeFragment,
        right: &CodeFragment,
        op: InfixOp,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        for provider in self.providers.iter() {
            if let Some(fragment) = provider.infix_op(node, left, right, op, ctx)? {
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }

    fn index_of(
        &self,
        source: &CodeFragment,
        offset: i32,
        ctx: &mut TranslationContext,
    ) -> Result<Option<Ir>> {
        for provider in self.providers.iter() {
            if let Some(ir) = provider.index_of(source, offset, ctx)? {
                return Ok(Some(ir));
            }
        }
        Ok(None)
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
        for provider in self.providers.iter() {
            if let Some(domain) =
                provider.foreach(start, end, start_inclusive, end_inclusive, element, ctx)?
            {
                return Ok(Some(domain));
            }
        }
        Ok(None)
    }

    fn convert(
        &self,
        original: &CodeFragment,
        target: &FType,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        for provider in self.providers.iter() {
            if let Some(fragment) = provider.convert(original, target, ctx)? {
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }
}

/// All function providers as one factory
#[derive(Clone)]
pub struct CompositeFunctionFactory {
    providers: FunctionFactories,
}

impl CompositeFunctionFactory {
    pub fn new(providers: FunctionFactories) -> Self {
        Self { providers }
    }
}

impl FeelFunctionFactory for CompositeFunctionFactory {
    /// Overload sets of every provider; an earlier provider hides a later one
    fn functions(&self) -> IndexMap<String, Vec<FType>> {
        let mut functions = IndexMap::new();
        for provider in self.providers.iter() {
            for (name, overloads) in provider.functions() {
                functions.entry(name).or_insert(overloads);
            }
        }
        functions
    }

    fn signature(&self, name: &str, args: &[FType]) -> Option<FType> {
        self.providers
            .iter()
            .find_map(|provider| provider.signature(name, args))
    }

    fn function(
        &self,
        node: &AstNode,
        name: &str,
        args: Vec<CodeFragment>,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        for provider in self.providers.iter() {
            if let Some(fragment) = provider.function(node, name, args.clone(), ctx)? {
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }

    fn value(&self, name: &str) -> Option<FunctionValue> {
        self.providers.iter().find_map(|provider| provider.value(name))
    }
}
