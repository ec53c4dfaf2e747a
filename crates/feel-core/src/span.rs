//! Source positions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of source text. Lines and columns are 1-based, offsets are byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    /// Compute a span from byte offsets into `source`
    pub fn from_offsets(source: &str, start: usize, end: usize) -> Self {
        let (start_line, start_column) = line_column(source, start);
        let (end_line, end_column) = line_column(source, end);
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            start,
            end,
        }
    }

    /// Smallest span covering both
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        let first = if self.start <= other.start { self } else { other };
        let last = if self.end >= other.end { self } else { other };
        SourceSpan {
            start_line: first.start_line,
            start_column: first.start_column,
            end_line: last.end_line,
            end_column: last.end_column,
            start: first.start,
            end: last.end,
        }
    }

    /// The covered text, if the offsets are valid for `source`
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut column = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_offsets() {
        let source = "a +\n  b";
        let span = SourceSpan::from_offsets(source, 6, 7);
        assert_eq!((span.start_line, span.start_column), (2, 3));
        assert_eq!(span.text(source), Some("b"));
    }

    #[test]
    fn test_merge() {
        let source = "a + b";
        let a = SourceSpan::from_offsets(source, 0, 1);
        let b = SourceSpan::from_offsets(source, 4, 5);
        let merged = b.merge(&a);
        assert_eq!(merged.text(source), Some("a + b"));
        assert_eq!(merged.to_string(), "1:1-1:6");
    }
}
