use nmpolicy_dsl::parse_expression;

use crate::error::CaptureEntryError;
use crate::expander::CapturePathResolver;
use crate::resolver::Resolver;
use crate::types::{CapturedStates, State};

/// Resolves capture reference paths against a fixed set of captured states.
#[derive(Debug, Clone)]
pub struct CaptureEntry<'a> {
    captured: &'a CapturedStates,
    resolver: Resolver,
}

impl<'a> CaptureEntry<'a> {
    pub fn new(captured: &'a CapturedStates) -> Self {
        CaptureEntry {
            captured,
            resolver: Resolver::new(),
        }
    }
}

impl CapturePathResolver for CaptureEntry<'_> {
    fn resolve_capture_entry_path(&self, expression: &str) -> Result<State, CaptureEntryError> {
        let node = parse_expression(expression)?;
        let state = self
            .resolver
            .resolve_capture_entry_path(expression, &node, self.captured)?;
        Ok(state)
    }
}
