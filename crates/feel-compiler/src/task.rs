//! Compile requests
//!
//! A `CompilerTask` is an immutable description of one compile call: what to
//! compile, under which names, and against which input types.

use crate::compiler::CompilerOptions;
use crate::context::TranslationContext;
use crate::factory::{FunctionFactories, TypeFactories};
use feel_core::{FType, FeelTyped, Value};
use indexmap::IndexMap;

/// Default unit name of compiled programs
pub const DEFAULT_UNIT_NAME: &str = "FeelUnit";

/// Default method name of compiled programs
pub const DEFAULT_METHOD_NAME: &str = "evaluate";

/// One compile request
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerTask {
    pub unit_name: String,
    pub method_name: String,
    pub source: String,
    /// Type of the root input
    pub input_type: FType,
    /// Type of `?`, for unary tests
    pub test_input_type: Option<FType>,
    /// Declared input variables, resolved before the root input's fields
    pub inputs: IndexMap<String, FType>,
}

impl CompilerTask {
    pub fn builder() -> CompilerTaskBuilder {
        CompilerTaskBuilder::default()
    }

    /// Fresh translation context for this task
    pub fn context(
        &self,
        options: &CompilerOptions,
        types: TypeFactories,
        functions: FunctionFactories,
    ) -> TranslationContext {
        TranslationContext::new(
            options.clone(),
            types,
            functions,
            self.input_type.clone(),
            self.inputs.clone(),
            self.test_input_type.clone(),
        )
    }

    /// Same task with another source text
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }
}

/// Builder for [`CompilerTask`]
#[derive(Debug, Clone)]
pub struct CompilerTaskBuilder {
    task: CompilerTask,
}

impl Default for CompilerTaskBuilder {
    fn default() -> Self {
        Self {
            task: CompilerTask {
                unit_name: DEFAULT_UNIT_NAME.to_string(),
                method_name: DEFAULT_METHOD_NAME.to_string(),
                source: String::new(),
                input_type: FType::Any,
                test_input_type: None,
                inputs: IndexMap::new(),
            },
        }
    }
}

impl CompilerTaskBuilder {
    pub fn unit_name(mut self, name: impl Into<String>) -> Self {
        self.task.unit_name = name.into();
        self
    }

    pub fn method_name(mut self, name: impl Into<String>) -> Self {
        self.task.method_name = name.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.task.source = source.into();
        self
    }

    pub fn input_type(mut self, input_type: FType) -> Self {
        self.task.input_type = input_type;
        self
    }

    /// Take the root input type from a sample value
    pub fn input_type_of_value(self, sample: &Value) -> Self {
        self.input_type(FType::of_value(sample))
    }

    /// Take the root input type from a host type
    pub fn input_type_of<T: FeelTyped>(self) -> Self {
        self.input_type(T::feel_type())
    }

    pub fn test_input_type(mut self, test_input_type: FType) -> Self {
        self.task.test_input_type = Some(test_input_type);
        self
    }

    /// Declare a named input variable
    pub fn input(mut self, name: impl Into<String>, ftype: FType) -> Self {
        self.task.inputs.insert(name.into(), ftype);
        self
    }

    pub fn build(self) -> CompilerTask {
        self.task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let task = CompilerTask::builder().source("1 + 1").build();
        assert_eq!(task.unit_name, DEFAULT_UNIT_NAME);
        assert_eq!(task.method_name, DEFAULT_METHOD_NAME);
        assert_eq!(task.input_type, FType::Any);
        assert!(task.test_input_type.is_none());
    }

    #[test]
    fn test_input_type_from_sample() {
        let sample = Value::context([("a", Value::from(1)), ("b", Value::from("x"))]);
        let task = CompilerTask::builder().input_type_of_value(&sample).build();
        assert_eq!(
            task.input_type,
            FType::context([("a", FType::INTEGER), ("b", FType::String)])
        );
    }

    #[test]
    fn test_input_type_from_host_type() {
        let task = CompilerTask::builder().input_type_of::<Vec<i64>>().build();
        assert_eq!(task.input_type, FType::list(FType::LONG));
    }
}
