use nmpolicy_dsl::{join_steps, Step, StepKind};

use crate::error::ResolveError;
use crate::types::State;

/// Cursor over the steps of a path while the visitor descends a state tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StatePath<'a> {
    steps: &'a [Step],
    index: usize,
}

impl<'a> StatePath<'a> {
    /// `steps` must not be empty.
    pub(crate) fn new(steps: &'a [Step]) -> Self {
        debug_assert!(!steps.is_empty());
        StatePath { steps, index: 0 }
    }

    pub(crate) fn current_step(&self) -> &'a Step {
        &self.steps[self.index]
    }

    pub(crate) fn current_identity(&self) -> Option<&'a str> {
        self.current_step().as_identity()
    }

    pub(crate) fn has_more_steps(&self) -> bool {
        self.index + 1 < self.steps.len()
    }

    pub(crate) fn next_step(&self) -> Self {
        StatePath {
            steps: self.steps,
            index: self.index + 1,
        }
    }

    pub(crate) fn not_found(&self) -> ResolveError {
        ResolveError::PathNotFound {
            step: self.current_step().to_string(),
            path: join_steps(self.steps),
            position: self.current_step().position,
        }
    }

    pub(crate) fn type_mismatch(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::PathTypeMismatch {
            step: self.current_step().to_string(),
            path: join_steps(self.steps),
            message: message.into(),
            position: self.current_step().position,
        }
    }

    pub(crate) fn unsupported_operation(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::UnsupportedOperation {
            message: message.into(),
            position: self.current_step().position,
        }
    }

    pub(crate) fn unsupported_type(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::UnsupportedType {
            message: message.into(),
            position: self.current_step().position,
        }
    }

    /// Value stored under the current identity step.
    pub(crate) fn access_map<'s>(
        &self,
        map: &'s serde_json::Map<String, State>,
    ) -> Result<&'s State, ResolveError> {
        let Some(key) = self.current_identity() else {
            return Err(self.type_mismatch("list index used on a map"));
        };
        map.get(key).ok_or_else(|| self.not_found())
    }

    /// Element at the current number step.
    pub(crate) fn access_slice<'s>(&self, slice: &'s [State]) -> Result<&'s State, ResolveError> {
        let StepKind::Number(index) = self.current_step().kind else {
            return Err(self.type_mismatch("map key used on a list"));
        };
        slice.get(index).ok_or_else(|| self.not_found())
    }
}

/// Short name of a state node's type for diagnostics.
pub(crate) fn type_name(state: &State) -> &'static str {
    match state {
        State::Null => "null",
        State::Bool(_) => "boolean",
        State::Number(_) => "number",
        State::String(_) => "string",
        State::Array(_) => "list",
        State::Object(_) => "map",
    }
}
