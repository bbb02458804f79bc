use crate::ast::{BinaryOperator, Node, NodeKind, Step, TernaryOperator, Terminal};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Token, TokenKind};

/// Builds an AST from the tokens produced by the [`Lexer`](crate::Lexer).
///
/// Grammar, from lowest to highest precedence:
///
/// ```text
/// expression := [path "|"] operation
/// operation  := path ("==" | "!=" | ":=") value
///             | path ("+" path)*
/// value      := STRING | NUMBER | TRUE | FALSE | path
/// path       := IDENTITY ("." (IDENTITY | NUMBER))*
/// ```
///
/// Filters and replaces without a piped-in path operate on the current state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    pub fn parse(&self, expression: &str, tokens: &[Token]) -> Result<Node, ParseError> {
        TokenCursor::new(expression, tokens).parse()
    }
}

struct TokenCursor<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    index: usize,
    eof: Token,
}

impl<'a> TokenCursor<'a> {
    fn new(expression: &'a str, tokens: &'a [Token]) -> Self {
        TokenCursor {
            expression,
            tokens,
            index: 0,
            eof: Token::new(expression.chars().count(), TokenKind::Eof, ""),
        }
    }

    /// Current token; a stream missing its EOF terminator behaves as if it had one.
    fn current(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() {
            self.index += 1;
        }
    }

    fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError {
            kind,
            message: message.into(),
            token: token.literal.clone(),
            position: token.position,
            expression: self.expression.to_string(),
        }
    }

    fn parse(mut self) -> Result<Node, ParseError> {
        let first = self.parse_operand()?;
        let node = if self.check(TokenKind::Pipe) {
            let input = match first {
                None => {
                    return Err(self.error(ParseErrorKind::InvalidPipe, "missing pipe in expression"))
                }
                Some(node) if node.as_path().is_none() => {
                    return Err(self.error(ParseErrorKind::InvalidPipe, "only paths can be piped in"))
                }
                Some(node) => node,
            };
            self.advance();
            let lhs = self.parse_operand()?;
            self.parse_operation(lhs, Some(input))?
        } else {
            self.parse_operation(first, None)?
        };

        match self.current().kind {
            TokenKind::Eof => Ok(node),
            TokenKind::Pipe => Err(self.error(ParseErrorKind::InvalidPipe, "only paths can be piped in")),
            _ => Err(self.error(
                ParseErrorKind::InvalidExpression,
                format!("unexpected token `{}`", self.current().literal),
            )),
        }
    }

    /// Parses a path or a literal; operators and EOF yield `None`.
    fn parse_operand(&mut self) -> Result<Option<Node>, ParseError> {
        let token = self.current().clone();
        let node = match token.kind {
            TokenKind::Identity => self.parse_path()?,
            TokenKind::Number if self.peek_kind() == Some(TokenKind::Dot) => {
                return Err(self.error(ParseErrorKind::InvalidPath, "path has to start with an identity"))
            }
            TokenKind::String | TokenKind::Number | TokenKind::True | TokenKind::False => {
                let terminal = self.parse_literal(ParseErrorKind::InvalidExpression)?;
                self.advance();
                terminal
            }
            TokenKind::Dot => {
                return Err(self.error(ParseErrorKind::InvalidPath, "missing identity before dot"))
            }
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.index + 1).map(|t| t.kind)
    }

    fn parse_operation(&mut self, lhs: Option<Node>, input: Option<Node>) -> Result<Node, ParseError> {
        let kind = self.current().kind;
        match kind {
            TokenKind::EqFilter => self.parse_ternary(ParseErrorKind::InvalidEqFilter, lhs, input),
            TokenKind::NeFilter => self.parse_ternary(ParseErrorKind::InvalidNeFilter, lhs, input),
            TokenKind::Replace => self.parse_ternary(ParseErrorKind::InvalidReplace, lhs, input),
            TokenKind::Merge if input.is_some() => Err(self.error(
                ParseErrorKind::InvalidPipe,
                "only filters and replaces can be piped into",
            )),
            TokenKind::Merge => self.parse_merge(lhs),
            TokenKind::Pipe if input.is_some() => {
                Err(self.error(ParseErrorKind::InvalidPipe, "multiple pipes are not supported"))
            }
            _ => match (lhs, input) {
                (None, Some(_)) => {
                    Err(self.error(ParseErrorKind::InvalidPipe, "missing pipe out expression"))
                }
                (Some(_), Some(_)) => Err(self.error(
                    ParseErrorKind::InvalidPipe,
                    "only filters and replaces can be piped into",
                )),
                (None, None) if kind == TokenKind::Eof => {
                    Err(self.error(ParseErrorKind::InvalidExpression, "empty expression"))
                }
                (None, None) => Err(self.error(
                    ParseErrorKind::InvalidExpression,
                    format!("unexpected token `{}`", self.current().literal),
                )),
                (Some(node), None) if node.as_path().is_none() => Err(ParseError {
                    kind: ParseErrorKind::InvalidExpression,
                    message: "expression has to be a path or an operation".to_string(),
                    token: match &node.kind {
                        NodeKind::Terminal(terminal) => terminal.literal(),
                        _ => String::new(),
                    },
                    position: node.position,
                    expression: self.expression.to_string(),
                }),
                (Some(node), None) => Ok(node),
            },
        }
    }

    fn parse_ternary(
        &mut self,
        kind: ParseErrorKind,
        lhs: Option<Node>,
        input: Option<Node>,
    ) -> Result<Node, ParseError> {
        let position = self.current().position;
        let path = match lhs {
            None => return Err(self.error(kind, "missing left hand argument")),
            Some(node) if node.as_path().is_none() => {
                return Err(self.error(kind, "left hand argument is not a path"))
            }
            Some(node) => node,
        };
        self.advance();

        let value_kind = self.current().kind;
        let value = match value_kind {
            TokenKind::Identity => self.parse_path()?,
            k if k.is_literal() => {
                let terminal = self.parse_literal(kind)?;
                self.advance();
                terminal
            }
            TokenKind::Eof => return Err(self.error(kind, "missing right hand argument")),
            _ => {
                return Err(self.error(
                    kind,
                    "right hand argument is not a string, number, boolean or path",
                ))
            }
        };

        let operator = Box::new(TernaryOperator {
            input: input.unwrap_or_else(|| Node::current_state(position)),
            path,
            value,
        });
        let node_kind = match kind {
            ParseErrorKind::InvalidEqFilter => NodeKind::EqFilter(operator),
            ParseErrorKind::InvalidNeFilter => NodeKind::NeFilter(operator),
            _ => NodeKind::Replace(operator),
        };
        Ok(Node::new(position, node_kind))
    }

    fn parse_merge(&mut self, lhs: Option<Node>) -> Result<Node, ParseError> {
        let mut node = match lhs {
            None => return Err(self.error(ParseErrorKind::InvalidMerge, "missing left hand argument")),
            Some(node) if node.as_path().is_none() => {
                return Err(self.error(ParseErrorKind::InvalidMerge, "left hand argument is not a path"))
            }
            Some(node) => node,
        };

        while self.check(TokenKind::Merge) {
            let position = self.current().position;
            self.advance();
            let right_kind = self.current().kind;
            let right = match right_kind {
                TokenKind::Identity => self.parse_path()?,
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::InvalidMerge, "missing right hand argument"))
                }
                _ => {
                    return Err(self.error(ParseErrorKind::InvalidMerge, "right hand argument is not a path"))
                }
            };
            node = Node::new(
                position,
                NodeKind::Merge(Box::new(BinaryOperator { left: node, right })),
            );
        }
        Ok(node)
    }

    fn parse_path(&mut self) -> Result<Node, ParseError> {
        let start = self.current().position;
        let mut steps = vec![Step::identity(start, self.current().literal.clone())];
        self.advance();

        loop {
            let kind = self.current().kind;
            if kind == TokenKind::Dot {
                self.advance();
                let token = self.current().clone();
                match token.kind {
                    TokenKind::Identity => steps.push(Step::identity(token.position, token.literal)),
                    TokenKind::Number => {
                        let index = token.literal.parse::<usize>().map_err(|_| {
                            self.error(ParseErrorKind::InvalidPath, "list index out of range")
                        })?;
                        steps.push(Step::number(token.position, index));
                    }
                    _ => {
                        return Err(self.error(
                            ParseErrorKind::InvalidPath,
                            "missing identity or number after dot",
                        ))
                    }
                }
                self.advance();
            } else if kind == TokenKind::Eof || kind.is_operator() {
                break;
            } else {
                return Err(self.error(ParseErrorKind::InvalidPath, "missing dot"));
            }
        }
        Ok(Node::new(start, NodeKind::Path(steps)))
    }

    fn parse_literal(&self, kind: ParseErrorKind) -> Result<Node, ParseError> {
        let token = self.current();
        let terminal = match token.kind {
            TokenKind::String => Terminal::String(token.literal.clone()),
            TokenKind::True => Terminal::Boolean(true),
            TokenKind::False => Terminal::Boolean(false),
            _ => Terminal::Number(
                token
                    .literal
                    .parse::<i64>()
                    .map_err(|_| self.error(kind, "number out of range"))?,
            ),
        };
        Ok(Node::new(token.position, NodeKind::Terminal(terminal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(expression: &str) -> Result<Node, ParseError> {
        let tokens = Lexer::new().lex(expression).unwrap();
        Parser::new().parse(expression, &tokens)
    }

    fn path(steps: Vec<Step>) -> Node {
        let position = steps[0].position;
        Node::new(position, NodeKind::Path(steps))
    }

    fn string(position: usize, value: &str) -> Node {
        Node::new(position, NodeKind::Terminal(Terminal::String(value.to_string())))
    }

    #[test]
    fn test_parse_path() {
        let node = parse("routes.running.0.next-hop-interface").unwrap();
        assert_eq!(
            node,
            path(vec![
                Step::identity(0, "routes"),
                Step::identity(7, "running"),
                Step::number(15, 0),
                Step::identity(17, "next-hop-interface"),
            ])
        );
    }

    #[test]
    fn test_parse_eq_filter() {
        let node = parse(r#"routes.running.destination=="0.0.0.0/0""#).unwrap();
        assert_eq!(
            node,
            Node::new(
                26,
                NodeKind::EqFilter(Box::new(TernaryOperator {
                    input: Node::current_state(26),
                    path: path(vec![
                        Step::identity(0, "routes"),
                        Step::identity(7, "running"),
                        Step::identity(15, "destination"),
                    ]),
                    value: string(28, "0.0.0.0/0"),
                }))
            )
        );
    }

    #[test]
    fn test_parse_ne_filter_with_capture_reference_value() {
        let node = parse("interfaces.name != capture.gw.routes.running.0.next-hop-interface").unwrap();
        let NodeKind::NeFilter(op) = node.kind else {
            panic!("Expected NeFilter, got {}", node);
        };
        assert!(op.input.is_current_state());
        let value = op.value.as_path().expect("value should be a path");
        assert_eq!(value.len(), 6);
        assert_eq!(value[0], Step::identity(19, "capture"));
        assert_eq!(value[4], Step::number(45, 0));
    }

    #[test]
    fn test_parse_piped_replace() {
        let node = parse(r#"capture.ethernets-up | interfaces.lldp.enabled:=true"#).unwrap();
        let NodeKind::Replace(op) = node.kind else {
            panic!("Expected Replace, got {}", node);
        };
        assert_eq!(
            op.input,
            path(vec![Step::identity(0, "capture"), Step::identity(8, "ethernets-up")])
        );
        assert_eq!(op.path.as_path().map(|s| s.len()), Some(3));
        assert_eq!(op.value, Node::new(48, NodeKind::Terminal(Terminal::Boolean(true))));
    }

    #[test]
    fn test_parse_replace_with_number() {
        let node = parse("interfaces.mtu := 1500").unwrap();
        let NodeKind::Replace(op) = node.kind else {
            panic!("Expected Replace, got {}", node);
        };
        assert_eq!(op.value, Node::new(18, NodeKind::Terminal(Terminal::Number(1500))));
    }

    #[test]
    fn test_parse_merge_is_left_associative() {
        let node = parse("a + b + c").unwrap();
        assert_eq!(node.to_string(), "Merge(Merge(Path=a, Path=b), Path=c)");
        assert_eq!(node.position, 6);
    }

    #[test]
    fn test_empty_expression() {
        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidExpression);
        assert_eq!(err.message, "empty expression");
    }

    #[test]
    fn test_missing_identity_after_dot() {
        let err = parse("routes.").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPath);
        assert_eq!(err.message, "missing identity or number after dot");
        assert_eq!(err.position, 7);

        let err = parse("routes..running").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPath);
        assert_eq!(err.token, ".");
    }

    #[test]
    fn test_missing_dot() {
        let err = parse("routes running").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPath);
        assert_eq!(err.message, "missing dot");
        assert_eq!(err.token, "running");
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_path_must_start_with_identity() {
        let err = parse("0.routes").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPath);

        let err = parse(".routes").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPath);
    }

    #[test]
    fn test_filter_errors() {
        let err = parse(r#"== "x""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEqFilter);
        assert_eq!(err.message, "missing left hand argument");

        let err = parse(r#""x" == "y""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEqFilter);
        assert_eq!(err.message, "left hand argument is not a path");

        let err = parse("routes.running.destination ==").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEqFilter);
        assert_eq!(err.message, "missing right hand argument");

        let err = parse("a != | b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNeFilter);
        assert_eq!(err.message, "right hand argument is not a string, number, boolean or path");
    }

    #[test]
    fn test_replace_errors() {
        let err = parse(":= 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidReplace);
        assert_eq!(err.message, "missing left hand argument");
        assert_eq!(err.error_code(), "ERR_NMPOLICY_PARSE_INVALID_REPLACE");
    }

    #[test]
    fn test_pipe_errors() {
        let err = parse("| a == \"b\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPipe);
        assert_eq!(err.message, "missing pipe in expression");

        let err = parse("capture.a |").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPipe);
        assert_eq!(err.message, "missing pipe out expression");

        let err = parse("capture.a | b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPipe);
        assert_eq!(err.message, "only filters and replaces can be piped into");

        let err = parse(r#"a == "x" | b == "y""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPipe);
        assert_eq!(err.message, "only paths can be piped in");

        let err = parse("capture.a | b + c").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPipe);
    }

    #[test]
    fn test_merge_errors() {
        let err = parse("a +").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidMerge);
        assert_eq!(err.message, "missing right hand argument");

        let err = parse(r#"a + "b""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidMerge);
        assert_eq!(err.message, "right hand argument is not a path");
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse(r#"a == "x" b"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidExpression);
        assert_eq!(err.token, "b");

        let err = parse(r#""x""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidExpression);
        assert_eq!(err.token, "x");
    }

    #[test]
    fn test_tokens_without_eof() {
        let tokens = vec![Token::new(0, TokenKind::Identity, "routes")];
        let node = Parser::new().parse("routes", &tokens).unwrap();
        assert_eq!(node, path(vec![Step::identity(0, "routes")]));
    }
}
