//! Tree interpreter for capture expression ASTs.
//!
//! Filter, Replace and Walk share the [`visitor::visit_state`] driver; Merge
//! combines already resolved trees.

mod filter;
mod merge;
mod path;
mod replace;
mod visitor;
mod walk;

use std::borrow::Cow;

use nmpolicy_dsl::{Node, NodeKind, Step, Terminal, TernaryOperator, CAPTURE_IDENTITY};
use tracing::{debug, trace};

use crate::error::{CaptureError, ExpressionResolveError, ResolveError};
use crate::types::{CaptureAstPool, CaptureExpressions, CapturedState, CapturedStates, State};
use filter::FilterOperator;

/// Evaluates capture ASTs against the current state and captured states.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver;

impl Resolver {
    pub fn new() -> Self {
        Resolver
    }

    /// Resolve every entry of `pool` and return them together with `captured`.
    ///
    /// Captures may reference each other; a reference is served from
    /// `captured` first and is otherwise resolved from the pool on demand.
    /// The first failure aborts the batch and names the capture it happened in.
    pub fn resolve(
        &self,
        expressions: &CaptureExpressions,
        pool: &CaptureAstPool,
        current_state: &State,
        captured: CapturedStates,
    ) -> Result<CapturedStates, CaptureError> {
        let mut context = ResolveContext {
            expressions,
            pool,
            current_state,
            captured,
            resolving: Vec::new(),
        };
        for capture_id in pool.keys() {
            context.resolve_capture(capture_id)?;
        }
        Ok(context.captured)
    }

    /// Resolve a capture reference path (`<id>.<path>` or
    /// `capture.<id>.<path>`) against already captured states.
    pub fn resolve_capture_entry_path(
        &self,
        expression: &str,
        node: &Node,
        captured: &CapturedStates,
    ) -> Result<State, ExpressionResolveError> {
        capture_entry_path(node, captured)
            .map_err(|source| ExpressionResolveError::new(expression, source))
    }
}

fn capture_entry_path(node: &Node, captured: &CapturedStates) -> Result<State, ResolveError> {
    let Some(steps) = node.as_path() else {
        return Err(ResolveError::UnsupportedOperation {
            message: "only capture entry paths can be referenced".to_string(),
            position: node.position,
        });
    };
    let reference = CaptureReference::split(steps, node.position)?;
    let Some(entry) = captured.get(reference.capture_id) else {
        return Err(reference.not_found());
    };
    walk::walk(&entry.state, reference.steps)
}

/// `capture.<id>.<rest>` or, where only captures can be named, `<id>.<rest>`.
struct CaptureReference<'a> {
    capture_id: &'a str,
    position: usize,
    steps: &'a [Step],
}

impl<'a> CaptureReference<'a> {
    fn split(steps: &'a [Step], position: usize) -> Result<Self, ResolveError> {
        match steps {
            [prefix, id, rest @ ..] if is_capture_prefix(prefix) => match id.as_identity() {
                Some(capture_id) => Ok(CaptureReference {
                    capture_id,
                    position: id.position,
                    steps: rest,
                }),
                None => Err(ResolveError::InvalidCaptureReference {
                    message: "missing capture entry name after 'capture'".to_string(),
                    position: id.position,
                }),
            },
            [first, rest @ ..] => match first.as_identity() {
                Some(capture_id) => Ok(CaptureReference {
                    capture_id,
                    position: first.position,
                    steps: rest,
                }),
                None => Err(ResolveError::InvalidCaptureReference {
                    message: "path has to start with a capture entry name".to_string(),
                    position: first.position,
                }),
            },
            [] => Err(ResolveError::InvalidCaptureReference {
                message: "empty path".to_string(),
                position,
            }),
        }
    }

    fn not_found(&self) -> ResolveError {
        ResolveError::CaptureNotFound {
            name: self.capture_id.to_string(),
            position: self.position,
        }
    }
}

fn is_capture_prefix(step: &Step) -> bool {
    step.as_identity() == Some(CAPTURE_IDENTITY)
}

enum EvalError {
    /// Raised by the capture being evaluated
    Local(ResolveError),
    /// Raised by a referenced capture and already attributed to it
    Nested(CaptureError),
}

impl From<ResolveError> for EvalError {
    fn from(err: ResolveError) -> Self {
        EvalError::Local(err)
    }
}

impl From<CaptureError> for EvalError {
    fn from(err: CaptureError) -> Self {
        EvalError::Nested(err)
    }
}

struct ResolveContext<'a> {
    expressions: &'a CaptureExpressions,
    pool: &'a CaptureAstPool,
    current_state: &'a State,
    captured: CapturedStates,
    /// Captures being evaluated, outermost first
    resolving: Vec<String>,
}

impl<'a> ResolveContext<'a> {
    fn resolve_capture(&mut self, capture_id: &str) -> Result<State, CaptureError> {
        if let Some(entry) = self.captured.get(capture_id) {
            trace!(capture_id, "capture already resolved");
            return Ok(entry.state.clone());
        }
        let pool = self.pool;
        let Some(node) = pool.get(capture_id) else {
            return Err(self.attribute(
                capture_id,
                ResolveError::CaptureNotFound {
                    name: capture_id.to_string(),
                    position: 0,
                },
            ));
        };

        debug!(capture_id, ast = %node, "resolving capture");
        self.resolving.push(capture_id.to_string());
        let evaluated = self.eval(node);
        self.resolving.pop();

        let state = match evaluated {
            Ok(state) => state,
            Err(EvalError::Local(err)) => return Err(self.attribute(capture_id, err)),
            Err(EvalError::Nested(err)) => return Err(err),
        };
        self.captured
            .insert(capture_id.to_string(), CapturedState::new(state.clone()));
        Ok(state)
    }

    fn attribute(&self, capture_id: &str, err: ResolveError) -> CaptureError {
        let expression = self
            .expressions
            .get(capture_id)
            .map(String::as_str)
            .unwrap_or_default();
        CaptureError::Resolve {
            capture_id: capture_id.to_string(),
            source: ExpressionResolveError::new(expression, err),
        }
    }

    fn eval(&mut self, node: &Node) -> Result<State, EvalError> {
        match &node.kind {
            NodeKind::EqFilter(operator) => self.eval_filter(operator, FilterOperator::Equal),
            NodeKind::NeFilter(operator) => self.eval_filter(operator, FilterOperator::NotEqual),
            NodeKind::Replace(operator) => self.eval_replace(operator),
            NodeKind::Merge(operator) => {
                let left = self.eval_merge_operand(&operator.left)?;
                let right = self.eval_merge_operand(&operator.right)?;
                Ok(merge::merge(left, right))
            }
            NodeKind::Path(steps) => match steps.first() {
                Some(first) if is_capture_prefix(first) => {
                    self.capture_reference(steps, node.position)
                }
                _ => Ok(walk::walk(self.current_state, steps)?),
            },
            NodeKind::Terminal(terminal) => Err(ResolveError::UnsupportedOperation {
                message: format!("expression root cannot be a single {}", terminal),
                position: node.position,
            }
            .into()),
        }
    }

    fn eval_filter(
        &mut self,
        operator: &TernaryOperator,
        filter_operator: FilterOperator,
    ) -> Result<State, EvalError> {
        let steps = operation_path(&operator.path)?;
        let expected = match self.eval_value(&operator.value)? {
            State::String(expected) => expected,
            other => {
                return Err(ResolveError::UnsupportedType {
                    message: format!(
                        "only strings can be compared, found {}",
                        path::type_name(&other)
                    ),
                    position: operator.value.position,
                }
                .into())
            }
        };
        let input = self.eval_input(&operator.input)?;
        Ok(filter::filter(&input, steps, filter_operator, &expected)?)
    }

    fn eval_replace(&mut self, operator: &TernaryOperator) -> Result<State, EvalError> {
        let steps = operation_path(&operator.path)?;
        let value = self.eval_value(&operator.value)?;
        let input = self.eval_input(&operator.input)?;
        Ok(replace::replace(&input, steps, &value)?)
    }

    fn eval_input(&mut self, node: &Node) -> Result<Cow<'a, State>, EvalError> {
        if node.is_current_state() {
            return Ok(Cow::Borrowed(self.current_state));
        }
        match node.as_path() {
            Some(steps) => Ok(Cow::Owned(self.capture_reference(steps, node.position)?)),
            None => Err(ResolveError::UnsupportedOperation {
                message: "only the current state or a capture reference can be piped in"
                    .to_string(),
                position: node.position,
            }
            .into()),
        }
    }

    fn eval_value(&mut self, node: &Node) -> Result<State, EvalError> {
        match &node.kind {
            NodeKind::Terminal(Terminal::String(value)) => Ok(State::String(value.clone())),
            NodeKind::Terminal(Terminal::Number(value)) => Ok(State::from(*value)),
            NodeKind::Terminal(Terminal::Boolean(value)) => Ok(State::Bool(*value)),
            NodeKind::Path(steps) => self.capture_reference(steps, node.position),
            _ => Err(ResolveError::UnsupportedOperation {
                message: format!("{} is not a valid value", node),
                position: node.position,
            }
            .into()),
        }
    }

    fn eval_merge_operand(&mut self, node: &Node) -> Result<State, EvalError> {
        match &node.kind {
            NodeKind::Merge(_) => self.eval(node),
            NodeKind::Path(steps) => self.capture_reference(steps, node.position),
            _ => Err(ResolveError::UnsupportedOperation {
                message: "only capture references can be merged".to_string(),
                position: node.position,
            }
            .into()),
        }
    }

    fn capture_reference(&mut self, steps: &[Step], position: usize) -> Result<State, EvalError> {
        let reference = CaptureReference::split(steps, position)?;
        let capture_id = reference.capture_id;
        if self.resolving.iter().any(|id| id == capture_id) {
            let mut chain = self.resolving.clone();
            chain.push(capture_id.to_string());
            return Err(ResolveError::CircularReference {
                chain: chain.join(" -> "),
                position: reference.position,
            }
            .into());
        }
        if !self.captured.contains_key(capture_id) && !self.pool.contains_key(capture_id) {
            return Err(reference.not_found().into());
        }
        let state = self.resolve_capture(capture_id)?;
        Ok(walk::walk(&state, reference.steps)?)
    }
}

fn operation_path(node: &Node) -> Result<&[Step], ResolveError> {
    node.as_path().ok_or_else(|| ResolveError::UnsupportedOperation {
        message: format!("{} is not a path", node),
        position: node.position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmpolicy_dsl::parse_expression;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn current_state() -> State {
        json!({
            "routes": {
                "running": [
                    {"destination": "0.0.0.0/0", "next-hop-interface": "eth1"},
                    {"destination": "1.1.1.0/24", "next-hop-interface": "eth2"}
                ]
            },
            "interfaces": [
                {"name": "eth1", "type": "ethernet", "state": "up"},
                {"name": "eth2", "type": "ethernet", "state": "down"},
                {"name": "br0", "type": "linux-bridge", "state": "up"}
            ]
        })
    }

    fn resolve(captures: &[(&str, &str)]) -> Result<CapturedStates, CaptureError> {
        let expressions: CaptureExpressions = captures
            .iter()
            .map(|(id, expr)| (id.to_string(), expr.to_string()))
            .collect();
        let pool: CaptureAstPool = expressions
            .iter()
            .map(|(id, expr)| (id.clone(), parse_expression(expr).unwrap()))
            .collect();
        Resolver::new().resolve(&expressions, &pool, &current_state(), CapturedStates::new())
    }

    fn state_of(captured: &CapturedStates, id: &str) -> State {
        captured.get(id).unwrap().state.clone()
    }

    #[test]
    fn test_capture_referencing_other_capture() {
        let captured = resolve(&[
            ("default-gw", r#"routes.running.destination=="0.0.0.0/0""#),
            (
                "base-iface",
                "interfaces.name==capture.default-gw.routes.running.0.next-hop-interface",
            ),
        ])
        .unwrap();
        assert_eq!(
            state_of(&captured, "base-iface"),
            json!({"interfaces": [{"name": "eth1", "type": "ethernet", "state": "up"}]})
        );
        assert!(captured.get("default-gw").unwrap().meta_info.time_stamp.is_none());
    }

    #[test]
    fn test_pipe_then_replace() {
        let captured = resolve(&[
            ("ethernets", r#"interfaces.type=="ethernet""#),
            ("up", r#"capture.ethernets | interfaces.state=="up""#),
            ("disabled", r#"ethernets | interfaces.state:="down""#),
        ])
        .unwrap();
        assert_eq!(
            state_of(&captured, "up"),
            json!({"interfaces": [{"name": "eth1", "type": "ethernet", "state": "up"}]})
        );
        assert_eq!(
            state_of(&captured, "disabled"),
            json!({"interfaces": [
                {"name": "eth1", "type": "ethernet", "state": "down"},
                {"name": "eth2", "type": "ethernet", "state": "down"}
            ]})
        );
    }

    #[test]
    fn test_bare_path_and_merge() {
        let captured = resolve(&[
            ("gw-route", "routes.running.0"),
            ("eth1", r#"interfaces.name=="eth1""#),
            ("br0", r#"interfaces.name=="br0""#),
            ("both", "capture.eth1 + br0"),
            ("nic", "capture.eth1.interfaces.0"),
        ])
        .unwrap();
        assert_eq!(
            state_of(&captured, "gw-route"),
            json!({"destination": "0.0.0.0/0", "next-hop-interface": "eth1"})
        );
        assert_eq!(
            state_of(&captured, "both"),
            json!({"interfaces": [
                {"name": "eth1", "type": "ethernet", "state": "up"},
                {"name": "br0", "type": "linux-bridge", "state": "up"}
            ]})
        );
        assert_eq!(state_of(&captured, "nic")["name"], json!("eth1"));
    }

    #[test]
    fn test_error_names_failing_capture_and_segment() {
        let err = resolve(&[
            ("gw", r#"routes.running.destination=="0.0.0.0/0""#),
            ("iface", "interfaces.name==capture.gw.routes.runnig.0.next-hop-interface"),
        ])
        .unwrap_err();
        assert_eq!(err.capture_id(), "iface");
        let CaptureError::Resolve { source, .. } = &err else {
            panic!("Expected a resolve error, got {:?}", err);
        };
        assert_eq!(
            source.source,
            ResolveError::PathNotFound {
                step: "runnig".to_string(),
                path: "routes.runnig.0.next-hop-interface".to_string(),
                position: 35,
            }
        );
    }

    #[test]
    fn test_unknown_capture_reference() {
        let err = resolve(&[("iface", "interfaces.name==capture.gw.routes")]).unwrap_err();
        let CaptureError::Resolve { source, .. } = &err else {
            panic!("Expected a resolve error, got {:?}", err);
        };
        assert_eq!(
            source.source,
            ResolveError::CaptureNotFound {
                name: "gw".to_string(),
                position: 25,
            }
        );
    }

    #[test]
    fn test_circular_reference() {
        let err = resolve(&[
            ("a", r#"capture.b | interfaces.name=="eth1""#),
            ("b", r#"capture.a | interfaces.name=="eth1""#),
        ])
        .unwrap_err();
        assert_eq!(err.capture_id(), "b");
        let CaptureError::Resolve { source, .. } = &err else {
            panic!("Expected a resolve error, got {:?}", err);
        };
        assert_eq!(
            source.source,
            ResolveError::CircularReference {
                chain: "a -> b -> a".to_string(),
                position: 8,
            }
        );
    }

    #[test]
    fn test_non_string_filter_value() {
        let err = resolve(&[("mtu", "interfaces.mtu==1500")]).unwrap_err();
        assert_eq!(err.error_code(), "ERR_NMPOLICY_RESOLVE_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_cached_capture_is_reused() {
        let expressions: CaptureExpressions =
            [("iface".to_string(), "interfaces.name==gw.name".to_string())].into();
        let pool: CaptureAstPool = expressions
            .iter()
            .map(|(id, expr)| (id.clone(), parse_expression(expr).unwrap()))
            .collect();
        let cached: CapturedStates =
            [("gw".to_string(), CapturedState::new(json!({"name": "br0"})))].into();

        let captured = Resolver::new()
            .resolve(&expressions, &pool, &current_state(), cached)
            .unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(state_of(&captured, "iface")["interfaces"][0]["name"], json!("br0"));
    }

    #[test]
    fn test_resolve_capture_entry_path() {
        let captured: CapturedStates = [(
            "gw".to_string(),
            CapturedState::new(json!({"routes": {"running": [{"destination": "0.0.0.0/0"}]}})),
        )]
        .into();

        let node = parse_expression("gw.routes.running.0.destination").unwrap();
        let value = Resolver::new()
            .resolve_capture_entry_path("gw.routes.running.0.destination", &node, &captured)
            .unwrap();
        assert_eq!(value, json!("0.0.0.0/0"));

        let node = parse_expression("capture.gw").unwrap();
        let value = Resolver::new()
            .resolve_capture_entry_path("capture.gw", &node, &captured)
            .unwrap();
        assert_eq!(value, captured["gw"].state);

        let node = parse_expression("other.routes").unwrap();
        let err = Resolver::new()
            .resolve_capture_entry_path("other.routes", &node, &captured)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "capture entry 'other' not found\n| other.routes\n| ^"
        );
    }
}
