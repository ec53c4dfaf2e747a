//! Host functions registered by the embedding application

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use crate::factory::FeelFunctionFactory;
use feel_core::ast::AstNode;
use feel_core::ir::{CallTarget, Ir};
use feel_core::types::{FunctionValue, NativeFunction};
use feel_core::{FType, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Function factory over registered `NativeFunction`s.
///
/// Each function has exactly one signature, its declared type.
#[derive(Default)]
pub struct NativeFunctionFactory {
    functions: IndexMap<String, Arc<NativeFunction>>,
}

impl NativeFunctionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any earlier one with the same name
    pub fn register(&mut self, function: NativeFunction) -> &mut Self {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
        self
    }

    /// Builder form of `register`
    pub fn with(mut self, function: NativeFunction) -> Self {
        self.register(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FeelFunctionFactory for NativeFunctionFactory {
    fn functions(&self) -> IndexMap<String, Vec<FType>> {
        self.functions
            .iter()
            .map(|(name, function)| (name.clone(), vec![function.ftype.clone()]))
            .collect()
    }

    fn function(
        &self,
        _node: &AstNode,
        name: &str,
        args: Vec<CodeFragment>,
        ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        let Some(function) = self.functions.get(name) else {
            return Ok(None);
        };
        let arg_types: Vec<FType> = args.iter().map(|a| a.ftype.clone()).collect();
        let Some(ret) = self.return_type(name, &arg_types) else {
            return Ok(None);
        };
        let index = ctx.intern(Value::Function(FunctionValue::Native(function.clone())));
        let ir = Ir::Call {
            target: CallTarget::Value(Ir::ConstRef(index).boxed()),
            args: args.into_iter().map(|a| a.ir).collect(),
            names: None,
        };
        Ok(Some(CodeFragment::new(ir, ret)))
    }

    fn value(&self, name: &str) -> Option<FunctionValue> {
        self.functions
            .get(name)
            .map(|function| FunctionValue::Native(function.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::infix::test_support::{context, input, node};

    fn greet() -> NativeFunction {
        NativeFunction::new(
            "greet",
            FType::function(vec![("name", FType::String)], FType::String),
            |args| match args.first() {
                Some(Value::String(name)) => Value::String(format!("hello {}", name)),
                _ => Value::Null,
            },
        )
    }

    #[test]
    fn test_register_and_lower() {
        let factory = NativeFunctionFactory::new().with(greet());
        assert_eq!(factory.len(), 1);

        let mut ctx = context();
        let name = input("name", FType::String);
        let call = factory
            .function(&node(), "greet", vec![name], &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(call.ftype, FType::String);
        assert!(matches!(
            call.ir,
            Ir::Call { target: CallTarget::Value(ref callee), .. } if matches!(**callee, Ir::ConstRef(_))
        ));
        assert_eq!(ctx.constants().len(), 1);
    }

    #[test]
    fn test_signature_mismatch_is_not_handled() {
        let factory = NativeFunctionFactory::new().with(greet());
        let mut ctx = context();
        let flag = input("flag", FType::Boolean);
        assert!(factory
            .function(&node(), "greet", vec![flag], &mut ctx)
            .unwrap()
            .is_none());
        assert!(factory.value("greet").is_some());
    }
}
