//! Code fragments
//!
//! A fragment is the result of lowering one AST node: the IR plus what the
//! compiler knows about it statically.

use crate::context::TranslationContext;
use feel_core::ir::Ir;
use feel_core::{FType, Number, Value};

/// Lowered node
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFragment {
    pub ir: Ir,
    pub ftype: FType,
    /// Compile-time value, when known
    pub constant: Option<Value>,
    /// False only when the value is proven non-null
    pub nullable: bool,
    /// Proven to be a non-null boolean or machine number
    pub primitive: bool,
}

impl CodeFragment {
    /// A computed value that may be null
    pub fn new(ir: Ir, ftype: FType) -> Self {
        Self {
            ir,
            ftype,
            constant: None,
            nullable: true,
            primitive: false,
        }
    }

    /// A compile-time constant, pooled when not a small scalar
    pub fn constant(value: Value, ctx: &mut TranslationContext) -> Self {
        let ftype = FType::of_value(&value);
        Self::typed_constant(value, ftype, ctx)
    }

    /// A compile-time constant with an explicit static type
    pub fn typed_constant(value: Value, ftype: FType, ctx: &mut TranslationContext) -> Self {
        let nullable = value.is_null();
        let primitive = is_primitive_value(&value);
        Self {
            ir: ctx.constant_ir(value.clone()),
            ftype,
            constant: Some(value),
            nullable,
            primitive,
        }
    }

    /// The null literal
    pub fn null() -> Self {
        Self {
            ir: Ir::null(),
            ftype: FType::Null,
            constant: Some(Value::Null),
            nullable: true,
            primitive: false,
        }
    }

    /// A local variable
    pub fn local(name: impl Into<String>, ftype: FType) -> Self {
        Self::new(Ir::Local(name.into()), ftype)
    }

    /// Mark as proven non-null
    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self.primitive = matches!(
            self.ftype,
            FType::Boolean
                | FType::Number(
                    feel_core::NumberKind::Integer
                        | feel_core::NumberKind::Long
                        | feel_core::NumberKind::Double
                )
        );
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        if nullable {
            self.nullable = true;
            self.primitive = false;
            self
        } else {
            self.non_null()
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

fn is_primitive_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Boolean(_)
            | Value::Number(Number::Integer(_) | Number::Long(_) | Number::Double(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilerOptions;
    use crate::factory;
    use indexmap::IndexMap;

    fn context() -> TranslationContext {
        TranslationContext::new(
            CompilerOptions::default(),
            factory::default_type_factories(),
            factory::default_function_factories(),
            FType::Any,
            IndexMap::new(),
            None,
        )
    }

    #[test]
    fn test_constants() {
        let mut ctx = context();
        let one = CodeFragment::constant(Value::from(1), &mut ctx);
        assert!(one.primitive);
        assert!(!one.nullable);
        assert_eq!(one.ftype, FType::INTEGER);

        let text = CodeFragment::constant(Value::from("x"), &mut ctx);
        assert!(!text.primitive);
        assert_eq!(text.ir, Ir::ConstRef(0));

        assert!(CodeFragment::null().nullable);
    }

    #[test]
    fn test_nullability() {
        let local = CodeFragment::local("x", FType::Boolean);
        assert!(local.nullable && !local.primitive);
        let proven = local.non_null();
        assert!(!proven.nullable && proven.primitive);
        assert!(proven.with_nullable(true).nullable);
    }
}
