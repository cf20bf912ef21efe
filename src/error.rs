//! Central error types for deadwood.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations.

use thiserror::Error;

use crate::ast::Span;

/// Errors produced while lexing or parsing source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// Input ended where a token was still required.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A character that cannot start any token.
    #[error("unexpected character {ch:?} at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// A specific punctuation token was required.
    #[error("expected {expected:?} at byte {pos}")]
    ExpectedToken { expected: char, pos: usize },

    /// `end` outside of any `if`/`while` body.
    #[error("unexpected 'end' at byte {pos}")]
    UnexpectedEnd { pos: usize },

    /// Integer literal does not fit the value type.
    #[error("integer literal out of range at bytes {start}..{end}")]
    IntegerOutOfRange { start: usize, end: usize },
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum DeadwoodError {
    /// Source text failed to lex or parse.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A graph-builder invariant was violated. Unrecoverable: this is a bug
    /// in graph construction, not a property of the analyzed program.
    #[error("internal consistency error during {phase}: {detail}")]
    InternalConsistency { phase: &'static str, detail: String },

    /// The analyzer only supports single-character variable names.
    #[error(
        "invalid variable name {name:?} at bytes {start}..{end}: names must be a single character",
        start = .span.start,
        end = .span.end
    )]
    InvalidVariableName { name: String, span: Span },
}

/// Convenience type alias for Results using [`DeadwoodError`].
pub type Result<T> = std::result::Result<T, DeadwoodError>;

impl DeadwoodError {
    /// Create an internal-consistency error with phase context.
    #[inline]
    pub fn internal(phase: &'static str, detail: impl Into<String>) -> Self {
        DeadwoodError::InternalConsistency {
            phase,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = SyntaxError::ExpectedToken {
            expected: '=',
            pos: 4,
        };
        assert_eq!(err.to_string(), "expected '=' at byte 4");
    }

    #[test]
    fn invalid_name_carries_span() {
        let err = DeadwoodError::InvalidVariableName {
            name: "ab".to_string(),
            span: Span::new(3, 5),
        };
        assert!(err.to_string().contains("\"ab\""));
        assert!(err.to_string().contains("3..5"));
    }
}
