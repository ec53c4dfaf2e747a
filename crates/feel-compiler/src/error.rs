//! Compiler error types

use feel_core::dmn::DefinitionError;
use feel_core::ir::Ir;
use feel_core::SourceSpan;
use feel_parser::ParseError;
use thiserror::Error;

/// Compiler error
#[derive(Error, Debug)]
pub enum CompileError {
    /// Malformed source text
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// A name, member or function with no resolution
    #[error("Unresolved symbol '{name}' at {span}")]
    UnresolvedSymbol { name: String, span: SourceSpan },

    /// No rule lowers an operator or node for the given types
    #[error("Translation error at {span}: {message}")]
    Translation {
        message: String,
        span: SourceSpan,
        /// Rendering of the IR generated for the node so far
        partial: String,
    },

    /// Decision table definition violates a structural invariant
    #[error(transparent)]
    Structural(#[from] DefinitionError),
}

impl CompileError {
    pub fn unresolved(name: impl Into<String>, span: SourceSpan) -> Self {
        CompileError::UnresolvedSymbol {
            name: name.into(),
            span,
        }
    }

    /// Translation error carrying the IR generated so far
    pub fn translation(message: impl Into<String>, span: SourceSpan, partial: &[&Ir]) -> Self {
        let partial = serde_json::to_string(partial).unwrap_or_default();
        CompileError::Translation {
            message: message.into(),
            span,
            partial,
        }
    }

    /// Span of the offending source, when known
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            CompileError::UnresolvedSymbol { span, .. } | CompileError::Translation { span, .. } => {
                Some(*span)
            }
            _ => None,
        }
    }
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::Value;

    #[test]
    fn test_translation_error_renders_partial_ir() {
        let left = Ir::Const(Value::from(1));
        let err = CompileError::translation("no rule", SourceSpan::default(), &[&left]);
        match &err {
            CompileError::Translation { partial, .. } => assert!(partial.contains("Const")),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("Translation error at"));
    }
}
