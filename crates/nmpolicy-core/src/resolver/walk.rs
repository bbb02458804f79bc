use nmpolicy_dsl::Step;
use serde_json::Map;

use super::path::StatePath;
use super::visitor::{visit_state, StateVisitor};
use crate::error::ResolveError;
use crate::types::State;

/// Sub-tree of `input` at `steps`. An empty path returns the whole input.
pub(crate) fn walk(input: &State, steps: &[Step]) -> Result<State, ResolveError> {
    if steps.is_empty() {
        return Ok(input.clone());
    }
    let walked = visit_state(StatePath::new(steps), input, &WalkVisitor)?;
    Ok(walked.unwrap_or(State::Null))
}

struct WalkVisitor;

impl StateVisitor for WalkVisitor {
    fn visit_last_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        path.access_map(map).map(|value| Some(value.clone()))
    }

    fn visit_last_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        path.access_slice(slice).map(|value| Some(value.clone()))
    }

    fn visit_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        let child = path.access_map(map)?;
        visit_state(path.next_step(), child, self)
    }

    fn visit_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        let child = path.access_slice(slice)?;
        visit_state(path.next_step(), child, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::replace::replace;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state() -> State {
        json!({
            "routes": {
                "running": [
                    {"destination": "0.0.0.0/0", "next-hop-interface": "eth1"}
                ]
            }
        })
    }

    #[test]
    fn test_walk_into_list() {
        let steps = vec![
            Step::identity(0, "routes"),
            Step::identity(7, "running"),
            Step::number(15, 0),
            Step::identity(17, "next-hop-interface"),
        ];
        assert_eq!(walk(&state(), &steps).unwrap(), json!("eth1"));
    }

    #[test]
    fn test_walk_empty_path_returns_input() {
        assert_eq!(walk(&state(), &[]).unwrap(), state());
    }

    #[test]
    fn test_walk_missing_step() {
        let steps = vec![Step::identity(0, "routes"), Step::identity(7, "config")];
        let err = walk(&state(), &steps).unwrap_err();
        assert_eq!(
            err,
            ResolveError::PathNotFound {
                step: "config".to_string(),
                path: "routes.config".to_string(),
                position: 7,
            }
        );
    }

    #[test]
    fn test_walk_out_of_range_and_mismatch() {
        let steps = vec![
            Step::identity(0, "routes"),
            Step::identity(7, "running"),
            Step::number(15, 3),
        ];
        let err = walk(&state(), &steps).unwrap_err();
        assert!(matches!(err, ResolveError::PathNotFound { position: 15, .. }));

        let steps = vec![
            Step::identity(0, "routes"),
            Step::identity(7, "running"),
            Step::identity(15, "destination"),
        ];
        let err = walk(&state(), &steps).unwrap_err();
        assert!(matches!(err, ResolveError::PathTypeMismatch { position: 15, .. }));
    }

    #[test]
    fn test_walk_index_on_map_is_type_mismatch() {
        let steps = vec![
            Step::identity(0, "routes"),
            Step::number(7, 0),
            Step::identity(9, "destination"),
        ];
        let err = walk(&state(), &steps).unwrap_err();
        assert!(matches!(err, ResolveError::PathTypeMismatch { position: 7, .. }));
    }

    #[test]
    fn test_walk_after_replace_returns_value() {
        let trees = [
            state(),
            State::Null,
            json!({"interfaces": [{"name": "eth1"}, {"name": "eth2"}]}),
            json!({"routes": {"config": null}}),
        ];
        let paths = [
            vec![Step::identity(0, "routes"), Step::identity(7, "config")],
            vec![
                Step::identity(0, "dns-resolver"),
                Step::identity(13, "config"),
                Step::identity(20, "search"),
            ],
        ];
        let value = json!({"search": ["example.com"]});
        for tree in &trees {
            for path in &paths {
                let replaced = replace(tree, path, &value).unwrap();
                assert_eq!(walk(&replaced, path).unwrap(), value, "tree {} path {:?}", tree, path);
            }
        }
    }
}
