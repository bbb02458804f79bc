use std::error::Error;
use std::fmt;
use thiserror::Error;

use crate::snippet::Snippet;

/// Error raised while tokenizing an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Character offset of the offending input
    pub position: usize,

    /// Human-readable description of what was wrong
    pub message: String,

    /// The expression being lexed
    pub expression: String,
}

impl LexError {
    pub(crate) fn new(expression: &str, position: usize, message: impl Into<String>) -> Self {
        LexError {
            position,
            message: message.into(),
            expression: expression.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        "ERR_NMPOLICY_LEX"
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}",
            self.message,
            Snippet::new(&self.expression, self.position)
        )
    }
}

impl Error for LexError {}

/// The grammar rule a [`ParseError`] was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid path")]
    InvalidPath,

    #[error("invalid equality filter")]
    InvalidEqFilter,

    #[error("invalid inequality filter")]
    InvalidNeFilter,

    #[error("invalid replace")]
    InvalidReplace,

    #[error("invalid merge")]
    InvalidMerge,

    #[error("invalid pipe")]
    InvalidPipe,

    #[error("invalid expression")]
    InvalidExpression,
}

/// Error raised while building the AST from a token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,

    /// What exactly was wrong inside the failing rule
    pub message: String,

    /// Literal of the token the parser stopped at (empty for EOF)
    pub token: String,

    /// Character offset of that token
    pub position: usize,

    /// The expression being parsed
    pub expression: String,
}

impl ParseError {
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::InvalidPath => "ERR_NMPOLICY_PARSE_INVALID_PATH",
            ParseErrorKind::InvalidEqFilter | ParseErrorKind::InvalidNeFilter => {
                "ERR_NMPOLICY_PARSE_INVALID_FILTER"
            }
            ParseErrorKind::InvalidReplace => "ERR_NMPOLICY_PARSE_INVALID_REPLACE",
            ParseErrorKind::InvalidMerge => "ERR_NMPOLICY_PARSE_INVALID_MERGE",
            ParseErrorKind::InvalidPipe => "ERR_NMPOLICY_PARSE_INVALID_PIPE",
            ParseErrorKind::InvalidExpression => "ERR_NMPOLICY_PARSE_INVALID_EXPRESSION",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        // EOF has no literal
        if !self.token.is_empty() {
            write!(f, " at `{}`", self.token)?;
        }
        write!(f, "\n{}", Snippet::new(&self.expression, self.position))
    }
}

impl Error for ParseError {}

/// Any error produced while turning an expression string into an AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ExpressionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ExpressionError::Lex(err) => err.error_code(),
            ExpressionError::Parse(err) => err.error_code(),
        }
    }

    /// Character offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            ExpressionError::Lex(err) => err.position,
            ExpressionError::Parse(err) => err.position,
        }
    }
}
