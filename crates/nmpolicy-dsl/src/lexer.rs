use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Turns an expression string into a token stream terminated by [`TokenKind::Eof`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    /// Lex the whole expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use nmpolicy_dsl::{Lexer, TokenKind};
    ///
    /// let tokens = Lexer::new().lex(r#"routes.running.destination=="0.0.0.0/0""#).unwrap();
    /// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    /// assert_eq!(kinds, vec![
    ///     TokenKind::Identity, TokenKind::Dot, TokenKind::Identity, TokenKind::Dot,
    ///     TokenKind::Identity, TokenKind::EqFilter, TokenKind::String, TokenKind::Eof,
    /// ]);
    /// ```
    pub fn lex(&self, expression: &str) -> Result<Vec<Token>, LexError> {
        ExpressionScanner::new(expression).scan()
    }
}

struct ExpressionScanner<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> ExpressionScanner<'a> {
    fn new(expression: &'a str) -> Self {
        ExpressionScanner {
            expression,
            chars: expression.chars().collect(),
            pos: 0,
        }
    }

    fn scan(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(current) = self.peek() else {
                tokens.push(Token::new(self.chars.len(), TokenKind::Eof, ""));
                return Ok(tokens);
            };
            let token = match current {
                c if c.is_ascii_digit() => self.lex_number()?,
                '"' | '\'' => self.lex_string()?,
                c if c.is_alphabetic() => self.lex_identity_or_boolean()?,
                '.' => self.single(TokenKind::Dot),
                '|' => self.single(TokenKind::Pipe),
                '+' => self.single(TokenKind::Merge),
                ':' => self.lex_equal_as(TokenKind::Replace)?,
                '=' => self.lex_equal_as(TokenKind::EqFilter)?,
                '!' => self.lex_equal_as(TokenKind::NeFilter)?,
                other => return Err(self.error(format!("illegal character '{}'", other))),
            };
            tokens.push(token);
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError::new(self.expression, self.pos, message)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let token = Token::new(self.pos, kind, self.chars[self.pos].to_string());
        self.pos += 1;
        token
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.pos += 1;
            } else if is_delimiter(c) {
                break;
            } else {
                return Err(self.error(format!("invalid number format ({} is not a digit)", c)));
            }
        }
        Ok(Token::new(start, TokenKind::Number, literal))
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let terminator = self.chars[self.pos];
        self.pos += 1;
        let mut literal = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(format!(
                        "invalid string format (missing {} terminator)",
                        terminator
                    )))
                }
                Some(c) if c == terminator => {
                    self.pos += 1;
                    return Ok(Token::new(start, TokenKind::String, literal));
                }
                Some(c) => {
                    literal.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn lex_identity_or_boolean(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                literal.push(c);
                self.pos += 1;
            } else if is_delimiter(c) {
                break;
            } else {
                return Err(self.error(format!(
                    "invalid identity format ({} is not a digit, letter, - or _)",
                    c
                )));
            }
        }
        let kind = match literal.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identity,
        };
        Ok(Token::new(start, kind, literal))
    }

    fn lex_equal_as(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let start = self.pos;
        let first = self.chars[self.pos];
        self.pos += 1;
        match self.peek() {
            Some('=') => {
                self.pos += 1;
                Ok(Token::new(start, kind, format!("{}=", first)))
            }
            Some(other) => Err(self.error(format!(
                "invalid {} operation format ({} is not equal char)",
                kind, other
            ))),
            None => Err(self.error(format!(
                "invalid {} operation format (missing equal char)",
                kind
            ))),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '|' | '+' | ':' | '=' | '!')
}
