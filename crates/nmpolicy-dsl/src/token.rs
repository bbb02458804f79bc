use serde::Serialize;
use std::fmt;

/// Kinds of tokens produced by the [`Lexer`](crate::Lexer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Eof,
    Identity,
    Number,
    String,
    True,
    False,

    /// `.`
    Dot,

    /// `|`
    Pipe,
    /// `:=`
    Replace,
    /// `==`
    EqFilter,
    /// `!=`
    NeFilter,
    /// `+`
    Merge,
}

impl TokenKind {
    /// Returns true for the tokens that combine two sub-expressions.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Pipe
                | TokenKind::Replace
                | TokenKind::EqFilter
                | TokenKind::NeFilter
                | TokenKind::Merge
        )
    }

    /// Returns true for the literal tokens that can be compared or assigned.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Number | TokenKind::True | TokenKind::False
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Identity => "IDENTITY",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Dot => "DOT",
            TokenKind::Pipe => "PIPE",
            TokenKind::Replace => "REPLACE",
            TokenKind::EqFilter => "EQFILTER",
            TokenKind::NeFilter => "NEFILTER",
            TokenKind::Merge => "MERGE",
        };
        f.write_str(name)
    }
}

/// A single lexed token.
///
/// `position` is the character offset of the first character of the token
/// inside the expression it was lexed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub position: usize,
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(position: usize, kind: TokenKind, literal: impl Into<String>) -> Self {
        Token {
            position,
            kind,
            literal: literal.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eof {
            write!(f, "EOF")
        } else {
            write!(f, "{} '{}'", self.kind, self.literal)
        }
    }
}
