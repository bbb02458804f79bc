//! Typed AST for capture expressions.
//!
//! The AST is built fresh for every evaluation and never persisted. Every node
//! carries the character offset it was parsed from so that later stages can
//! point at the failing fragment of the expression.

use serde::Serialize;
use std::fmt;

/// Identity that stands for the current state when a filter or replace has no
/// piped-in input.
pub const CURRENT_STATE_IDENTITY: &str = "currentState";

/// Identity that marks the start of an explicit capture reference
/// (`capture.<id>.<path>`).
pub const CAPTURE_IDENTITY: &str = "capture";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "pos")]
    pub position: usize,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    EqFilter(Box<TernaryOperator>),
    NeFilter(Box<TernaryOperator>),
    Replace(Box<TernaryOperator>),
    Merge(Box<BinaryOperator>),
    Path(Vec<Step>),
    Terminal(Terminal),
}

/// Operands shared by filters and replace: `input | path <op> value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TernaryOperator {
    /// Piped-in path, or the current-state identity terminal
    pub input: Node,
    /// Path the operation applies to
    pub path: Node,
    /// Literal or capture reference
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryOperator {
    pub left: Node,
    pub right: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminal {
    String(String),
    Identity(String),
    Number(i64),
    Boolean(bool),
}

/// One segment of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    #[serde(rename = "pos")]
    pub position: usize,
    #[serde(flatten)]
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Map key
    Identity(String),
    /// List index
    Number(usize),
}

impl Node {
    pub fn new(position: usize, kind: NodeKind) -> Self {
        Node { position, kind }
    }

    pub fn current_state(position: usize) -> Self {
        Node::new(
            position,
            NodeKind::Terminal(Terminal::Identity(CURRENT_STATE_IDENTITY.to_string())),
        )
    }

    pub fn is_current_state(&self) -> bool {
        matches!(&self.kind, NodeKind::Terminal(Terminal::Identity(id)) if id == CURRENT_STATE_IDENTITY)
    }

    /// Path steps when this node is a path.
    pub fn as_path(&self) -> Option<&[Step]> {
        match &self.kind {
            NodeKind::Path(steps) => Some(steps),
            _ => None,
        }
    }
}

impl Terminal {
    /// Source text of the terminal, without quotes.
    pub fn literal(&self) -> String {
        match self {
            Terminal::String(s) | Terminal::Identity(s) => s.clone(),
            Terminal::Number(n) => n.to_string(),
            Terminal::Boolean(b) => b.to_string(),
        }
    }
}

impl Step {
    pub fn identity(position: usize, name: impl Into<String>) -> Self {
        Step {
            position,
            kind: StepKind::Identity(name.into()),
        }
    }

    pub fn number(position: usize, index: usize) -> Self {
        Step {
            position,
            kind: StepKind::Number(index),
        }
    }

    pub fn as_identity(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Identity(name) => Some(name),
            StepKind::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<usize> {
        match self.kind {
            StepKind::Number(index) => Some(index),
            StepKind::Identity(_) => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::EqFilter(op) => write!(f, "EqFilter({})", op),
            NodeKind::NeFilter(op) => write!(f, "NeFilter({})", op),
            NodeKind::Replace(op) => write!(f, "Replace({})", op),
            NodeKind::Merge(op) => write!(f, "Merge({}, {})", op.left, op.right),
            NodeKind::Path(steps) => write!(f, "Path={}", join_steps(steps)),
            NodeKind::Terminal(terminal) => write!(f, "{}", terminal),
        }
    }
}

impl fmt::Display for TernaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.input, self.path, self.value)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::String(s) => write!(f, "String={}", s),
            Terminal::Identity(s) => write!(f, "Identity={}", s),
            Terminal::Number(n) => write!(f, "Number={}", n),
            Terminal::Boolean(b) => write!(f, "Boolean={}", b),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StepKind::Identity(name) => f.write_str(name),
            StepKind::Number(index) => write!(f, "{}", index),
        }
    }
}

/// Renders steps back into their dotted form.
pub fn join_steps(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|step| step.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
