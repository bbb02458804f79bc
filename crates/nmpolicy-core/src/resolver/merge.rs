use crate::types::State;

/// Structural merge of two trees.
///
/// Maps merge recursively per key, lists concatenate and any other
/// combination resolves to the right-hand side.
pub(crate) fn merge(left: State, right: State) -> State {
    match (left, right) {
        (State::Object(mut merged), State::Object(right)) => {
            for (key, right_value) in right {
                let value = match merged.remove(&key) {
                    Some(left_value) => merge(left_value, right_value),
                    None => right_value,
                };
                merged.insert(key, value);
            }
            State::Object(merged)
        }
        (State::Array(mut merged), State::Array(right)) => {
            merged.extend(right);
            State::Array(merged)
        }
        (_, right) => right,
    }
}
