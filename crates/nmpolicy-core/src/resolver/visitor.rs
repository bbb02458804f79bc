use serde_json::Map;

use super::path::{type_name, StatePath};
use crate::error::ResolveError;
use crate::types::State;

/// One operation over a state tree, driven step by step by [`visit_state`].
///
/// `visit_map`/`visit_slice` are called while there are steps left after the
/// current one, `visit_last_map`/`visit_last_slice` for the final step.
/// Returning `Ok(None)` means the visited node produced no result, which
/// filters use to drop non-matching branches. Each visitor decides how a
/// step of the wrong kind is reported.
pub(crate) trait StateVisitor {
    fn visit_last_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError>;

    fn visit_last_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError>;

    fn visit_map(
        &self,
        path: StatePath<'_>,
        map: &Map<String, State>,
    ) -> Result<Option<State>, ResolveError>;

    fn visit_slice(
        &self,
        path: StatePath<'_>,
        slice: &[State],
    ) -> Result<Option<State>, ResolveError>;
}

pub(crate) fn visit_state<V>(
    path: StatePath<'_>,
    state: &State,
    visitor: &V,
) -> Result<Option<State>, ResolveError>
where
    V: StateVisitor + ?Sized,
{
    match state {
        State::Object(map) if path.has_more_steps() => visitor.visit_map(path, map),
        State::Object(map) => visitor.visit_last_map(path, map),
        State::Array(slice) if path.has_more_steps() => visitor.visit_slice(path, slice),
        State::Array(slice) => visitor.visit_last_slice(path, slice),
        other => Err(path.type_mismatch(format!(
            "cannot step into a {} value",
            type_name(other)
        ))),
    }
}
