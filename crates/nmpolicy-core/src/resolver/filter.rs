use nmpolicy_dsl::Step;
use serde_json::Map;

use super::path::{type_name, StatePath};
use super::visitor::{visit_state, StateVisitor};
use crate::error::ResolveError;
use crate::types::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterOperator {
    Equal,
    NotEqual,
}

impl FilterOperator {
    fn matches(self, obtained: &str, expected: &str) -> bool {
        match self {
            FilterOperator::Equal => obtained == expected,
            FilterOperator::NotEqual => obtained != expected,
        }
    }
}

/// Keep the parts of `input` whose value at `steps` compares to `expected`.
///
/// Maps outside any list keep only the key on the path, so the result is the
/// minimal tree leading to the matches, and a missing key there is
/// `PathNotFound`. The first list on the path is filtered element-wise;
/// elements keep all their keys and elements lacking the key are dropped.
pub(crate) fn filter(
    input: &State,
    steps: &[Step],
    operator: FilterOperator,
    expected: &str,
) -> Result<State, ResolveError> {
    if steps.is_empty() {
        return Err(ResolveError::UnsupportedOperation {
            message: "filter path is empty".to_string(),
            position: 0,
        });
    }
    let visitor = FilterVisitor {
        merge_visit_result: false,
        operator,
        expected,
    };
    let filtered = visit_state(StatePath::new(steps), input, &visitor)?;
    Ok(filtered.unwrap_or_else(|| empty_like(input)))
}

fn empty_like(state: &State) -> State {
    match state {
        State::Array(_) => State::Array(Vec::new()),
        _ => State::Object(Map::new()),
    }
}

struct FilterVisitor<'e> {
    merge_visit_result: bool,
    operator: FilterOperator,
    expected: &'e str,
}

impl FilterVisitor<'_> {
    fn nested(&self) -> Self {
        FilterVisitor {
            merge_visit_result: true,
            operator: self.operator,
            expected: self.expected,
        }
    }
}

impl FilterVisitor<'_> {
    /// Above the first list the path must exist, list elements without
    /// the key are simply not matched.
    fn missing_key(&self, path: StatePath<'_>) -> Result<Option<State>, ResolveError> {
        if self.merge_visit_result {
            Ok(None)
        } else {
            Err(path.not_found())
        }
    }
}

impl StateVisitor for FilterVisitor<'_> {
    fn visit_last_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        let Some(key) = path.current_identity() else {
            return Err(path.unsupported_operation("filtering by list index is not supported"));
        };
        let Some(obtained) = map.get(key) else {
            return self.missing_key(path);
        };
        let State::String(obtained) = obtained else {
            return Err(path.unsupported_type(format!(
                "only string values can be filtered, found {} at '{}'",
                type_name(obtained),
                key
            )));
        };
        if self.operator.matches(obtained, self.expected) {
            Ok(Some(State::Object(map.clone())))
        } else {
            Ok(None)
        }
    }

    fn visit_last_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        self.visit_slice(path, slice)
    }

    fn visit_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError> {
        let Some(key) = path.current_identity() else {
            return Err(path.unsupported_operation("filtering by list index is not supported"));
        };
        let Some(child) = map.get(key) else {
            return self.missing_key(path);
        };
        let Some(visit_result) = visit_state(path.next_step(), child, self)? else {
            return Ok(None);
        };
        let mut filtered = if self.merge_visit_result {
            map.clone()
        } else {
            Map::new()
        };
        filtered.insert(key.to_string(), visit_result);
        Ok(Some(State::Object(filtered)))
    }

    fn visit_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError> {
        if path.current_identity().is_none() {
            return Err(path.unsupported_operation("filtering by list index is not supported"));
        }
        // Only the outermost list drops elements
        let nested = self.nested();
        let mut filtered = Vec::with_capacity(slice.len());
        let mut has_visit_result = false;
        for element in slice {
            match visit_state(path, element, &nested)? {
                Some(visit_result) => {
                    has_visit_result = true;
                    filtered.push(visit_result);
                }
                None if self.merge_visit_result => filtered.push(element.clone()),
                None => {}
            }
        }
        if !has_visit_result {
            return Ok(None);
        }
        Ok(Some(State::Array(filtered)))
    }
}
