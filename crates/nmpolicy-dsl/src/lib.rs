//! # NMPolicy DSL
//!
//! Front end of the NMPolicy capture expression language. Capture expressions
//! select sub-trees of a network state document, for example:
//!
//! * `routes.running.destination=="0.0.0.0/0"` keeps the default routes
//! * `interfaces.name==capture.default-gw.routes.running.0.next-hop-interface`
//!   keeps the interface used by another capture
//! * `capture.ethernets | interfaces.lldp.enabled:=true` rewrites a captured state
//! * `capture.base + capture.extra` merges two captures
//!
//! This crate turns such a string into a typed AST. Evaluating the AST against
//! a state lives in `nmpolicy-core`.
//!
//! ## Example
//!
//! ```
//! use nmpolicy_dsl::{parse_expression, NodeKind};
//!
//! let node = parse_expression(r#"routes.running.destination=="0.0.0.0/0""#).unwrap();
//! assert!(matches!(node.kind, NodeKind::EqFilter(_)));
//! ```

#![forbid(unsafe_code)]

mod error;
mod lexer;
mod parser;
mod snippet;

pub mod ast;
pub mod token;

pub use ast::{
    join_steps, BinaryOperator, Node, NodeKind, Step, StepKind, TernaryOperator, Terminal,
    CAPTURE_IDENTITY, CURRENT_STATE_IDENTITY,
};
pub use error::{ExpressionError, LexError, ParseError, ParseErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use snippet::Snippet;
pub use token::{Token, TokenKind};

/// Lex and parse an expression in one go.
///
/// # Errors
///
/// Returns [`ExpressionError::Lex`] for malformed tokens and
/// [`ExpressionError::Parse`] for token sequences that do not match the grammar.
///
/// ```
/// use nmpolicy_dsl::{parse_expression, ExpressionError};
///
/// let err = parse_expression("routes..running").unwrap_err();
/// assert!(matches!(err, ExpressionError::Parse(_)));
/// assert_eq!(err.error_code(), "ERR_NMPOLICY_PARSE_INVALID_PATH");
/// ```
pub fn parse_expression(expression: &str) -> Result<Node, ExpressionError> {
    let tokens = Lexer::new().lex(expression)?;
    let node = Parser::new().parse(expression, &tokens)?;
    Ok(node)
}

/// Returns the version of the crate as defined in Cargo.toml.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
