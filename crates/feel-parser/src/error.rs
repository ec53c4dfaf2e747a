//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed source text
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    /// Source contains no tokens
    #[error("Empty expression")]
    Empty,
}

impl ParseError {
    /// Build a syntax error located at a byte offset of `source`
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let span = feel_core::SourceSpan::from_offsets(source, offset, offset);
        ParseError::Syntax {
            message: message.into(),
            line: span.start_line,
            column: span.start_column,
        }
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
