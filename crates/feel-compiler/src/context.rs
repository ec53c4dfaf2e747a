//! Translation context
//!
//! One context is created per compile call. It carries the scoped symbol
//! table used by the AST builder, the constant pool of the program being
//! generated, the factories in provider order, and a typed side-table for
//! singletons that live for one pass.

use crate::compiler::CompilerOptions;
use crate::factory::{
    CompositeFunctionFactory, CompositeTypeFactory, FeelFunctionFactory, FeelTypeFactory,
    FunctionFactories, TypeFactories,
};
use feel_core::ast::NameOrigin;
use feel_core::ir::Ir;
use feel_core::types::FunctionValue;
use feel_core::{FType, Number, Value};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

/// Built-in multi-word type names
const TYPE_NAMES: &[&str] = &[
    "date and time",
    "days and time duration",
    "years and months duration",
];

/// A resolved name
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub ftype: FType,
    pub origin: NameOrigin,
}

#[derive(Debug, Default)]
struct Scope {
    entries: Vec<(String, FType)>,
    /// Unknown names may be fields of an untyped element
    open: bool,
}

/// Per-compile state shared by the builder, the AST compiler and the factories
pub struct TranslationContext {
    options: CompilerOptions,
    types: TypeFactories,
    functions: FunctionFactories,
    input_type: FType,
    inputs: IndexMap<String, FType>,
    test_input_type: Option<FType>,
    scopes: Vec<Scope>,
    constants: Vec<Value>,
    side_table: HashMap<TypeId, Box<dyn Any>>,
    warnings: Vec<String>,
}

impl TranslationContext {
    pub fn new(
        options: CompilerOptions,
        types: TypeFactories,
        functions: FunctionFactories,
        input_type: FType,
        inputs: IndexMap<String, FType>,
        test_input_type: Option<FType>,
    ) -> Self {
        Self {
            options,
            types,
            functions,
            input_type,
            inputs,
            test_input_type,
            scopes: Vec::new(),
            constants: Vec::new(),
            side_table: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn input_type(&self) -> &FType {
        &self.input_type
    }

    pub fn test_input_type(&self) -> Option<&FType> {
        self.test_input_type.as_ref()
    }

    /// Replace the type of `?`, returning the previous one
    pub fn replace_test_input_type(&mut self, ftype: Option<FType>) -> Option<FType> {
        std::mem::replace(&mut self.test_input_type, ftype)
    }

    /// All type factories, in provider order
    pub fn type_factory(&self) -> CompositeTypeFactory {
        CompositeTypeFactory::new(self.types.clone())
    }

    /// All function factories, in provider order
    pub fn function_factory(&self) -> CompositeFunctionFactory {
        CompositeFunctionFactory::new(self.functions.clone())
    }

    // === Scopes ===

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Push a scope whose unknown names resolve dynamically as locals
    pub fn push_open_scope(&mut self) {
        self.scopes.push(Scope {
            entries: Vec::new(),
            open: true,
        });
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a local in the innermost scope
    pub fn declare(&mut self, name: impl Into<String>, ftype: FType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.entries.push((name.into(), ftype));
        }
    }

    /// Whether `name` is bound by an enclosing scope
    pub fn is_local(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.entries.iter().any(|(n, _)| n == name))
    }

    /// Resolve a name: locals, then declared inputs, then root input fields,
    /// then functions used as values.
    ///
    /// Inside an open scope every unknown name is an untyped local.
    pub fn resolve(&self, name: &str) -> Option<Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some((_, ftype)) = scope.entries.iter().rev().find(|(n, _)| n == name) {
                return Some(Symbol {
                    ftype: ftype.clone(),
                    origin: NameOrigin::Local,
                });
            }
        }
        if self.scopes.iter().any(|scope| scope.open) {
            return Some(Symbol {
                ftype: FType::Any,
                origin: NameOrigin::Local,
            });
        }
        if let Some(ftype) = self.inputs.get(name) {
            return Some(Symbol {
                ftype: ftype.clone(),
                origin: NameOrigin::Input,
            });
        }
        if let Some(ftype) = self.input_type.field_type(name) {
            return Some(Symbol {
                ftype: ftype.clone(),
                origin: NameOrigin::Input,
            });
        }
        if let Some(function) = self.function_factory().value(name) {
            return Some(Symbol {
                ftype: function.ftype().clone(),
                origin: NameOrigin::Function,
            });
        }
        if self.input_type.is_any() || !self.options.strict_names {
            return Some(Symbol {
                ftype: FType::Any,
                origin: NameOrigin::Dynamic,
            });
        }
        None
    }

    /// A function used as a value
    pub fn function_value(&self, name: &str) -> Option<FunctionValue> {
        self.function_factory().value(name)
    }

    /// Names the parser should recognize, including multi-word ones
    pub fn known_names(&self) -> HashSet<String> {
        let mut names: HashSet<String> = self.inputs.keys().cloned().collect();
        if let FType::Context(fields) = &self.input_type {
            names.extend(fields.iter().map(|(n, _)| n.clone()));
        }
        names.extend(self.function_factory().functions().into_keys());
        names.extend(self.type_factory().types().into_iter().map(|(n, _)| n));
        names.extend(TYPE_NAMES.iter().map(|n| n.to_string()));
        for scope in &self.scopes {
            names.extend(scope.entries.iter().map(|(n, _)| n.clone()));
        }
        names
    }

    /// Resolve a named type: built-in names first, then provider types
    pub fn type_by_name(&self, name: &str) -> Option<FType> {
        FType::by_name(name).or_else(|| {
            self.type_factory()
                .types()
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t)
        })
    }

    // === Constants ===

    /// Add a value to the constant pool, reusing an equal entry of the same type
    pub fn intern(&mut self, value: Value) -> usize {
        let ftype = FType::of_value(&value);
        if let Some(index) = self
            .constants
            .iter()
            .position(|c| *c == value && FType::of_value(c) == ftype)
        {
            return index;
        }
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// IR loading a constant. Small scalars are inlined, the rest is pooled.
    pub fn constant_ir(&mut self, value: Value) -> Ir {
        match value {
            Value::Null
            | Value::Boolean(_)
            | Value::Number(Number::Integer(_) | Number::Long(_) | Number::Double(_)) => {
                Ir::Const(value)
            }
            other => Ir::ConstRef(self.intern(other)),
        }
    }

    /// Value of an inline or pooled constant
    pub fn constant_value<'a>(&'a self, ir: &'a Ir) -> Option<&'a Value> {
        match ir {
            Ir::Const(value) => Some(value),
            Ir::ConstRef(index) => self.constants.get(*index),
            _ => None,
        }
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn into_constants(self) -> Vec<Value> {
        self.constants
    }

    // === Side table ===

    /// Pass-scoped singleton of type `T`, created on first use
    pub fn singleton<T: Any + Default>(&mut self) -> &mut T {
        self.side_table
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()) as Box<dyn Any>)
            .downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("side table entry keyed by its own TypeId"))
    }

    /// Fresh local name, unique within this compile
    pub fn fresh_local(&mut self, prefix: &str) -> String {
        let counter = self.singleton::<LocalCounter>();
        counter.0 += 1;
        format!("{}#{}", prefix, counter.0)
    }

    // === Warnings ===

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

#[derive(Default)]
struct LocalCounter(usize);
