//! Evaluation results

use crate::error::RuntimeError;
use feel_core::types::{FunctionValue, RangeValue};
use feel_core::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Outcome of evaluating an expression or decision table.
///
/// Expected evaluation failures (allowed-values violations, hit policy
/// violations) are reported here instead of as errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl EvalResult {
    /// Successful null result
    pub const NULL: EvalResult = EvalResult {
        success: true,
        message: None,
        value: None,
    };

    /// Successful result. A null value is stored as absent.
    pub fn of(value: Value) -> Self {
        Self {
            success: true,
            message: None,
            value: (!value.is_null()).then_some(value),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            value: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Value of a successful result; `None` for null and for failures
    pub fn get(&self) -> Option<&Value> {
        if self.success {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Successful null
    pub fn is_null(&self) -> bool {
        self.success && self.value.is_none()
    }

    /// The value (null when absent) or the error message
    pub fn into_result(self) -> std::result::Result<Value, String> {
        if self.success {
            Ok(self.value.unwrap_or_default())
        } else {
            Err(self.message.unwrap_or_default())
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.get().and_then(Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.get().and_then(Value::as_str)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        self.get().and_then(Value::as_list)
    }

    pub fn as_context(&self) -> Option<&IndexMap<String, Value>> {
        self.get().and_then(Value::as_context)
    }

    pub fn as_range(&self) -> Option<&RangeValue> {
        match self.get() {
            Some(Value::Range(range)) => Some(range),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self.get() {
            Some(Value::Function(function)) => Some(function),
            _ => None,
        }
    }
}

impl From<std::result::Result<Value, RuntimeError>> for EvalResult {
    fn from(result: std::result::Result<Value, RuntimeError>) -> Self {
        match result {
            Ok(value) => EvalResult::of(value),
            Err(err) => EvalResult::error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_success() {
        let result = EvalResult::of(Value::Null);
        assert!(result.is_success());
        assert!(result.is_null());
        assert_eq!(result, EvalResult::NULL);
    }

    #[test]
    fn test_error_has_no_value() {
        let result = EvalResult::error("rule 1 output 1 values check failed");
        assert!(!result.is_success());
        assert!(!result.is_null());
        assert_eq!(result.get(), None);
        assert_eq!(
            result.into_result(),
            Err("rule 1 output 1 values check failed".to_string())
        );
    }

    #[test]
    fn test_accessors() {
        let result = EvalResult::of(Value::from("hello"));
        assert_eq!(result.as_str(), Some("hello"));
        assert_eq!(result.as_bool(), None);
    }
}
