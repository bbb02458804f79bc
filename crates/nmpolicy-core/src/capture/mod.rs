//! Batch resolution of named capture expressions.

mod entry;

pub use entry::CaptureEntry;

use nmpolicy_dsl::{ExpressionError, LexError, Lexer, Node, ParseError, Parser, Token};
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::resolver::Resolver;
use crate::types::{CaptureAstPool, CaptureExpressions, CapturedStates, State};

/// Tokenizer seam of [`Capture`].
#[cfg_attr(test, mockall::automock)]
pub trait ExpressionLexer {
    fn lex(&self, expression: &str) -> Result<Vec<Token>, LexError>;
}

/// Parser seam of [`Capture`].
#[cfg_attr(test, mockall::automock)]
pub trait ExpressionParser {
    fn parse(&self, expression: &str, tokens: &[Token]) -> Result<Node, ParseError>;
}

impl ExpressionLexer for Lexer {
    fn lex(&self, expression: &str) -> Result<Vec<Token>, LexError> {
        Lexer::lex(self, expression)
    }
}

impl ExpressionParser for Parser {
    fn parse(&self, expression: &str, tokens: &[Token]) -> Result<Node, ParseError> {
        Parser::parse(self, expression, tokens)
    }
}

/// Resolves capture expressions against a state, reusing cached captures.
#[derive(Debug, Clone)]
pub struct Capture<L = Lexer, P = Parser> {
    lexer: L,
    parser: P,
    resolver: Resolver,
}

impl Capture {
    pub fn new() -> Self {
        Capture::with_lexer_and_parser(Lexer::new(), Parser::new())
    }
}

impl Default for Capture {
    fn default() -> Self {
        Capture::new()
    }
}

impl<L, P> Capture<L, P>
where
    L: ExpressionLexer,
    P: ExpressionParser,
{
    pub fn with_lexer_and_parser(lexer: L, parser: P) -> Self {
        Capture {
            lexer,
            parser,
            resolver: Resolver::new(),
        }
    }

    /// Resolve `requested` against `state`.
    ///
    /// Entries of `cache` that are also requested are returned as they are,
    /// without lexing, parsing or resolving their expression again. All other
    /// requested captures are resolved in one batch and come back unstamped.
    /// The first failing capture aborts the whole batch.
    pub fn resolve(
        &self,
        requested: &CaptureExpressions,
        cache: &CapturedStates,
        state: &State,
    ) -> Result<CapturedStates, CaptureError> {
        if requested.is_empty() {
            return Ok(CapturedStates::new());
        }

        let mut cached = CapturedStates::new();
        let mut pending = CaptureExpressions::new();
        for (capture_id, expression) in requested {
            match cache.get(capture_id) {
                Some(entry) => {
                    debug!(capture_id = %capture_id, "using cached capture");
                    cached.insert(capture_id.clone(), entry.clone());
                }
                None => {
                    pending.insert(capture_id.clone(), expression.clone());
                }
            }
        }
        if pending.is_empty() {
            return Ok(cached);
        }

        let mut pool = CaptureAstPool::new();
        for (capture_id, expression) in &pending {
            let node = self
                .parse(expression)
                .map_err(|source| CaptureError::Expression {
                    capture_id: capture_id.clone(),
                    source,
                })?;
            pool.insert(capture_id.clone(), node);
        }

        info!(
            cached = cached.len(),
            resolving = pool.len(),
            "resolving captures"
        );
        self.resolver.resolve(&pending, &pool, state, cached)
    }

    fn parse(&self, expression: &str) -> Result<Node, ExpressionError> {
        let tokens = self.lexer.lex(expression)?;
        let node = self.parser.parse(expression, &tokens)?;
        Ok(node)
    }
}
