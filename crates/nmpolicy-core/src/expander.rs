//! Placeholder substitution over a desired-state template.
//!
//! A string leaf is substituted only when the whole (trimmed) string is a
//! `{{ expr }}` placeholder. Anything else, including strings that merely
//! contain a placeholder, is copied through unchanged.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write as _;
use tracing::debug;

use crate::error::{CaptureEntryError, ExpandError};
use crate::types::State;

lazy_static! {
    // Whole-string `{{ expr }}`, braces are not allowed inside the expression
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"^\{\{\s*([^{}\s][^{}]*?)\s*\}\}$").unwrap();
}

/// Root name used when rendering the location of a placeholder.
const TEMPLATE_ROOT: &str = "desiredState";

/// Resolves the expression found inside a `{{ }}` placeholder.
pub trait CapturePathResolver {
    fn resolve_capture_entry_path(&self, expression: &str) -> Result<State, CaptureEntryError>;
}

/// Returns the expression of an exact `{{ expr }}` placeholder.
pub fn placeholder_expression(value: &str) -> Option<&str> {
    PLACEHOLDER_REGEX
        .captures(value.trim())
        .and_then(|captures| captures.get(1))
        .map(|expression| expression.as_str())
}

#[derive(Debug, Clone)]
pub struct StateExpander<R> {
    resolver: R,
}

impl<R: CapturePathResolver> StateExpander<R> {
    pub fn new(resolver: R) -> Self {
        StateExpander { resolver }
    }

    /// Expanded copy of `template`. The first unresolvable placeholder
    /// aborts the expansion.
    pub fn expand(&self, template: &State) -> Result<State, ExpandError> {
        let mut expanded = template.clone();
        self.expand_in_place(&mut expanded, &mut Vec::new())?;
        Ok(expanded)
    }

    fn expand_in_place(
        &self,
        state: &mut State,
        location: &mut Vec<Segment>,
    ) -> Result<(), ExpandError> {
        match state {
            State::String(value) => {
                let Some(expression) = placeholder_expression(value) else {
                    return Ok(());
                };
                let resolved = self
                    .resolver
                    .resolve_capture_entry_path(expression)
                    .map_err(|source| ExpandError {
                        path: render_location(location),
                        expression: expression.to_string(),
                        source,
                    })?;
                debug!(
                    path = %render_location(location),
                    expression,
                    "expanded placeholder"
                );
                *state = resolved;
            }
            State::Object(map) => {
                for (key, value) in map.iter_mut() {
                    location.push(Segment::Key(key.clone()));
                    self.expand_in_place(value, location)?;
                    location.pop();
                }
            }
            State::Array(list) => {
                for (index, value) in list.iter_mut().enumerate() {
                    location.push(Segment::Index(index));
                    self.expand_in_place(value, location)?;
                    location.pop();
                }
            }
            State::Null | State::Bool(_) | State::Number(_) => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

fn render_location(location: &[Segment]) -> String {
    let mut rendered = TEMPLATE_ROOT.to_string();
    for segment in location {
        // Writing to a String cannot fail
        let _ = match segment {
            Segment::Key(key) => write!(rendered, ".{}", key),
            Segment::Index(index) => write!(rendered, "[{}]", index),
        };
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionResolveError;
    use crate::error::ResolveError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    /// Resolves `known` to a fixed value and records every lookup.
    struct StubResolver {
        calls: RefCell<Vec<String>>,
    }

    impl StubResolver {
        fn new() -> Self {
            StubResolver {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CapturePathResolver for &StubResolver {
        fn resolve_capture_entry_path(&self, expression: &str) -> Result<State, CaptureEntryError> {
            self.calls.borrow_mut().push(expression.to_string());
            match expression {
                "known" => Ok(json!("0.0.0.0/0")),
                "ports" => Ok(json!([{"name": "eth1"}])),
                _ => Err(ExpressionResolveError::new(
                    expression,
                    ResolveError::CaptureNotFound {
                        name: expression.to_string(),
                        position: 0,
                    },
                )
                .into()),
            }
        }
    }

    #[test]
    fn test_placeholder_expression() {
        assert_eq!(placeholder_expression("{{ a.b }}"), Some("a.b"));
        assert_eq!(placeholder_expression("  {{a.b}} "), Some("a.b"));
        assert_eq!(
            placeholder_expression(r#"{{ capture.x | y=="z" }}"#),
            Some(r#"capture.x | y=="z""#)
        );
        assert_eq!(placeholder_expression("prefix-{{ a.b }}"), None);
        assert_eq!(placeholder_expression("{{ a }}-suffix"), None);
        assert_eq!(placeholder_expression("{{ a }} {{ b }}"), None);
        assert_eq!(placeholder_expression("{{ }}"), None);
        assert_eq!(placeholder_expression("a.b"), None);
    }

    #[test]
    fn test_expand_nested_template() {
        let stub = StubResolver::new();
        let template = json!({
            "interfaces": [
                {
                    "name": "br1",
                    "ipv4": {"address": "{{ known }}", "enabled": true},
                    "bridge": {"port": "{{ ports }}"},
                    "description": "prefix-{{ known }}"
                }
            ],
            "mtu": 1500
        });
        let expanded = StateExpander::new(&stub).expand(&template).unwrap();
        assert_eq!(
            expanded,
            json!({
                "interfaces": [
                    {
                        "name": "br1",
                        "ipv4": {"address": "0.0.0.0/0", "enabled": true},
                        "bridge": {"port": [{"name": "eth1"}]},
                        "description": "prefix-{{ known }}"
                    }
                ],
                "mtu": 1500
            })
        );
        assert_eq!(stub.calls.borrow().len(), 2);
    }

    #[test]
    fn test_expand_error_reports_location() {
        let stub = StubResolver::new();
        let template = json!({"interfaces": [{"name": "br1"}, {"ipv4": {"address": "{{ missing.x }}"}}]});
        let err = StateExpander::new(&stub).expand(&template).unwrap_err();
        assert_eq!(err.path, "desiredState.interfaces[1].ipv4.address");
        assert_eq!(err.expression, "missing.x");
        assert_eq!(err.error_code(), "ERR_NMPOLICY_RESOLVE_CAPTURE_NOT_FOUND");
    }

    #[test]
    fn test_expand_root_placeholder() {
        let stub = StubResolver::new();
        let expanded = StateExpander::new(&stub).expand(&json!("{{ ports }}")).unwrap();
        assert_eq!(expanded, json!([{"name": "eth1"}]));
    }
}
