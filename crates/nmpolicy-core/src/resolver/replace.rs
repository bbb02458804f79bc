use nmpolicy_dsl::Step;
use serde_json::Map;

use super::path::StatePath;
use super::visitor::{visit_state, StateVisitor};
use crate::error::ResolveError;
use crate::types::State;

/// Copy of `input` with the leaf at `steps` set to `value`.
///
/// Missing or null maps along the path are created, and lists on the path
/// get the replacement applied to each of their elements.
pub(crate) fn replace(input: &State, steps: &[Step], value: &State) -> Result<State, ResolveError> {
    if steps.is_empty() {
        return Err(ResolveError::UnsupportedOperation {
            message: "replace path is empty".to_string(),
            position: 0,
        });
    }
    let empty = State::Object(Map::new());
    let root = if input.is_null() { &empty } else { input };
    let visitor = ReplaceVisitor { value };
    let replaced = visit_state(StatePath::new(steps), root, &visitor)?;
    Ok(replaced.unwrap_or_else(|| root.clone()))
}

struct ReplaceVisitor<'v> {
    value: &'v State,
}

impl ReplaceVisitor<'_> {
    fn replace_each(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        if path.current_identity().is_none() {
            return Err(path.unsupported_operation("replacing by list index is not supported"));
        }
        let mut replaced = Vec::with_capacity(slice.len());
        for element in slice {
            let element = visit_state(path, element, self)?.unwrap_or_else(|| element.clone());
            replaced.push(element);
        }
        Ok(Some(State::Array(replaced)))
    }
}

impl StateVisitor for ReplaceVisitor<'_> {
    fn visit_last_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        let Some(key) = path.current_identity() else {
            return Err(path.unsupported_operation("replacing by list index is not supported"));
        };
        let mut replaced = map.clone();
        replaced.insert(key.to_string(), self.value.clone());
        Ok(Some(State::Object(replaced)))
    }

    fn visit_last_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        self.replace_each(path, slice)
    }

    fn visit_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        let Some(key) = path.current_identity() else {
            return Err(path.unsupported_operation("replacing by list index is not supported"));
        };
        let empty = State::Object(Map::new());
        let child = match map.get(key) {
            Some(State::Null) | None => &empty,
            Some(child) => child,
        };
        let replaced_child =
            visit_state(path.next_step(), child, self)?.unwrap_or_else(|| child.clone());
        let mut replaced = map.clone();
        replaced.insert(key.to_string(), replaced_child);
        Ok(Some(State::Object(replaced)))
    }

    fn visit_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        self.replace_each(path, slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn identities(names: &[&str]) -> Vec<Step> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Step::identity(i * 10, *name))
            .collect()
    }

    #[test]
    fn test_replace_over_list_elements() {
        let state = json!({
            "interfaces": [
                {"name": "eth1", "lldp": {"enabled": false}},
                {"name": "eth2"}
            ]
        });
        let steps = identities(&["interfaces", "lldp", "enabled"]);
        let result = replace(&state, &steps, &json!(true)).unwrap();
        assert_eq!(
            result,
            json!({
                "interfaces": [
                    {"name": "eth1", "lldp": {"enabled": true}},
                    {"name": "eth2", "lldp": {"enabled": true}}
                ]
            })
        );
        // Input is left untouched
        assert_eq!(state["interfaces"][0]["lldp"]["enabled"], json!(false));
    }

    #[test]
    fn test_replace_creates_missing_maps() {
        let steps = identities(&["dns-resolver", "config", "server"]);
        let result = replace(&json!({"routes": {}}), &steps, &json!(["8.8.8.8"])).unwrap();
        assert_eq!(
            result,
            json!({
                "routes": {},
                "dns-resolver": {"config": {"server": ["8.8.8.8"]}}
            })
        );

        let result = replace(&State::Null, &identities(&["a", "b"]), &json!("x")).unwrap();
        assert_eq!(result, json!({"a": {"b": "x"}}));

        let result = replace(&json!({"a": null}), &identities(&["a", "b"]), &json!(1)).unwrap();
        assert_eq!(result, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_replace_by_index_is_unsupported() {
        let steps = vec![Step::identity(0, "interfaces"), Step::number(11, 0)];
        let err = replace(&json!({"interfaces": [{}]}), &steps, &json!("x")).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsupportedOperation { position: 11, .. }
        ));
    }

    #[test]
    fn test_replace_through_scalar_is_type_mismatch() {
        let steps = identities(&["hostname", "name"]);
        let err = replace(&json!({"hostname": "node01"}), &steps, &json!("x")).unwrap_err();
        assert!(matches!(err, ResolveError::PathTypeMismatch { .. }));
    }
}
