//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum FeelError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Parser error
    #[error("Parser error: {0}")]
    ParseError(#[from] feel_parser::ParseError),

    /// Compiler error
    #[error("Compiler error: {0}")]
    CompileError(#[from] feel_compiler::CompileError),

    /// Invalid decision table definition
    #[error("Invalid decision table: {0}")]
    DefinitionError(#[from] feel_core::dmn::DefinitionError),

    /// The compilation service rejected a program
    #[error("Compilation service error: {0}")]
    CompilationError(#[from] feel_runtime::CompilationError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] feel_runtime::RuntimeError),

    /// A compiled unit did not expose the expected entry point
    #[error("Unit '{0}' has no loadable entry point")]
    LoadError(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, FeelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use feel_runtime::RuntimeError;

    #[test]
    fn test_config_error() {
        let error = FeelError::ConfigError("decimal precision must be positive".to_string());
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("decimal precision"));
    }

    #[test]
    fn test_load_error() {
        let error = FeelError::LoadError("Feel_1234".to_string());
        assert_eq!(error.to_string(), "Unit 'Feel_1234' has no loadable entry point");
    }

    #[test]
    fn test_runtime_error_conversion() {
        let error: FeelError = RuntimeError::UnknownFunction("f".to_string()).into();
        assert!(matches!(error, FeelError::RuntimeError(_)));
        assert!(error.to_string().contains("Unknown function: f"));
    }

    #[test]
    fn test_compilation_error_conversion() {
        let error: FeelError = feel_runtime::CompilationError {
            unit: "U".to_string(),
            message: "bad".to_string(),
            program: "{}".to_string(),
        }
        .into();
        assert!(error.to_string().starts_with("Compilation service error: Failed to compile unit 'U'"));
    }

    #[test]
    fn test_error_debug_format() {
        let error = FeelError::ConfigError("test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("ConfigError"));
    }
}
