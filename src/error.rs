//! Error types for SLQ.

use std::fmt;

use thiserror::Error;

use crate::parser::Span;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Build,
    Validation,
    Render,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Parse => "parse",
            Stage::Build => "build",
            Stage::Validation => "validation",
            Stage::Render => "render",
            Stage::Config => "config",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SlqError {
    /// Query text is not valid SLQ.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        position: usize,
        message: String,
    },

    /// The parse tree could not be turned into an AST.
    #[error("Build error at {span} '{text}': {message}")]
    Build {
        span: Span,
        text: String,
        message: String,
    },

    /// The AST violates a structural rule (ambiguous selector, misplaced clause...).
    #[error("Validation error at {span} '{text}': {message}")]
    Validation {
        span: Span,
        text: String,
        message: String,
    },

    #[error("Render error at {span} '{text}': {message}")]
    Render {
        span: Span,
        text: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlqError {
    /// Create a parse error at the given byte offset of `input`.
    pub fn parse(input: &str, position: usize, message: impl Into<String>) -> Self {
        let (line, column) = Span::new(position, position).line_col(input);
        Self::Parse {
            line,
            column,
            position,
            message: message.into(),
        }
    }

    pub fn build(span: Span, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Build {
            span,
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn validation(span: Span, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            span,
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn render(span: Span, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            span,
            text: text.into(),
            message: message.into(),
        }
    }

    /// The pipeline stage this error originated from. `Io` counts as config.
    pub fn stage(&self) -> Stage {
        match self {
            SlqError::Parse { .. } => Stage::Parse,
            SlqError::Build { .. } => Stage::Build,
            SlqError::Validation { .. } => Stage::Validation,
            SlqError::Render { .. } => Stage::Render,
            SlqError::Config(_) | SlqError::Io(_) => Stage::Config,
        }
    }

    /// Source span of the offending input, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            SlqError::Parse { position, .. } => Some(Span::new(*position, *position)),
            SlqError::Build { span, .. }
            | SlqError::Validation { span, .. }
            | SlqError::Render { span, .. } => Some(*span),
            SlqError::Config(_) | SlqError::Io(_) => None,
        }
    }
}

/// Result type alias for SLQ operations.
pub type SlqResult<T> = Result<T, SlqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = SlqError::parse("@a |\n .x ?", 9, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at line 2, column 5: unexpected character"
        );
        assert_eq!(err.stage(), Stage::Parse);
    }

    #[test]
    fn test_validation_error_display() {
        let err = SlqError::validation(Span::new(3, 7), ".uid", "ambiguous selector");
        assert_eq!(
            err.to_string(),
            "Validation error at 3..7 '.uid': ambiguous selector"
        );
        assert_eq!(err.span(), Some(Span::new(3, 7)));
    }
}
