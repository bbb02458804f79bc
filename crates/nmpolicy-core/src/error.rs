use std::error::Error;
use std::fmt;
use thiserror::Error;

use nmpolicy_dsl::{ExpressionError, Snippet};

/// Failure evaluating an AST against a state tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("step '{step}' from path '{path}' not found")]
    PathNotFound {
        step: String,
        path: String,
        position: usize,
    },

    #[error("invalid step '{step}' from path '{path}': {message}")]
    PathTypeMismatch {
        step: String,
        path: String,
        message: String,
        position: usize,
    },

    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String, position: usize },

    #[error("unsupported type: {message}")]
    UnsupportedType { message: String, position: usize },

    #[error("invalid capture reference: {message}")]
    InvalidCaptureReference { message: String, position: usize },

    #[error("capture entry '{name}' not found")]
    CaptureNotFound { name: String, position: usize },

    #[error("circular capture reference: {chain}")]
    CircularReference { chain: String, position: usize },
}

impl ResolveError {
    /// Character offset in the expression the error points at.
    pub fn position(&self) -> usize {
        match self {
            ResolveError::PathNotFound { position, .. }
            | ResolveError::PathTypeMismatch { position, .. }
            | ResolveError::UnsupportedOperation { position, .. }
            | ResolveError::UnsupportedType { position, .. }
            | ResolveError::InvalidCaptureReference { position, .. }
            | ResolveError::CaptureNotFound { position, .. }
            | ResolveError::CircularReference { position, .. } => *position,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ResolveError::PathNotFound { .. } => "ERR_NMPOLICY_RESOLVE_PATH_NOT_FOUND",
            ResolveError::PathTypeMismatch { .. } => "ERR_NMPOLICY_RESOLVE_PATH_TYPE_MISMATCH",
            ResolveError::UnsupportedOperation { .. } => "ERR_NMPOLICY_RESOLVE_UNSUPPORTED_OPERATION",
            ResolveError::UnsupportedType { .. } => "ERR_NMPOLICY_RESOLVE_UNSUPPORTED_TYPE",
            ResolveError::InvalidCaptureReference { .. } => {
                "ERR_NMPOLICY_RESOLVE_INVALID_CAPTURE_REFERENCE"
            }
            ResolveError::CaptureNotFound { .. } => "ERR_NMPOLICY_RESOLVE_CAPTURE_NOT_FOUND",
            ResolveError::CircularReference { .. } => "ERR_NMPOLICY_RESOLVE_CIRCULAR_REFERENCE",
        }
    }
}

/// A [`ResolveError`] together with the expression it was raised from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionResolveError {
    pub expression: String,
    pub source: ResolveError,
}

impl ExpressionResolveError {
    pub fn new(expression: impl Into<String>, source: ResolveError) -> Self {
        ExpressionResolveError {
            expression: expression.into(),
            source,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.source.error_code()
    }
}

impl fmt::Display for ExpressionResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}",
            self.source,
            Snippet::new(&self.expression, self.source.position())
        )
    }
}

impl Error for ExpressionResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Failure resolving one capture of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("failed to parse capture expression '{capture_id}': {source}")]
    Expression {
        capture_id: String,
        source: ExpressionError,
    },

    #[error("failed to resolve capture expression '{capture_id}': {source}")]
    Resolve {
        capture_id: String,
        source: ExpressionResolveError,
    },
}

impl CaptureError {
    /// The capture the failure is attributed to.
    pub fn capture_id(&self) -> &str {
        match self {
            CaptureError::Expression { capture_id, .. } | CaptureError::Resolve { capture_id, .. } => {
                capture_id
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CaptureError::Expression { source, .. } => source.error_code(),
            CaptureError::Resolve { source, .. } => source.error_code(),
        }
    }
}

/// Failure resolving a `{{ capture.path }}` reference against captured states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureEntryError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Resolve(#[from] ExpressionResolveError),
}

impl CaptureEntryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CaptureEntryError::Expression(err) => err.error_code(),
            CaptureEntryError::Resolve(err) => err.error_code(),
        }
    }
}

/// A template placeholder could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to expand '{expression}' at '{path}': {source}")]
pub struct ExpandError {
    /// Location of the placeholder inside the template, e.g. `interfaces[0].ipv4`
    pub path: String,
    pub expression: String,
    pub source: CaptureEntryError,
}

impl ExpandError {
    pub fn error_code(&self) -> &'static str {
        self.source.error_code()
    }
}

/// YAML or JSON (de)serialization failure.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DocumentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DocumentError::Json(_) => "ERR_NMPOLICY_DOCUMENT_JSON",
            DocumentError::Yaml(_) => "ERR_NMPOLICY_DOCUMENT_YAML",
        }
    }
}

/// Any failure of `generate_state`.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("failed to decode current state: {0}")]
    Decode(#[source] DocumentError),

    #[error("failed to encode desired state: {0}")]
    Encode(#[source] DocumentError),

    #[error("current state is empty but captures need resolving: {}", .0.join(", "))]
    MissingCurrentState(Vec<String>),
}

impl GenerateError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GenerateError::Capture(err) => err.error_code(),
            GenerateError::Expand(err) => err.error_code(),
            GenerateError::Decode(err) | GenerateError::Encode(err) => err.error_code(),
            GenerateError::MissingCurrentState(_) => "ERR_NMPOLICY_MISSING_CURRENT_STATE",
        }
    }
}
