use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::capture::{Capture, CaptureEntry};
use crate::encoding::decode_state;
use crate::error::GenerateError;
use crate::expander::StateExpander;
use crate::types::{CachedState, GeneratedState, MetaInfo, PolicySpec};

/// Generate the desired state of `policy` against `current_state`.
///
/// `current_state` is a YAML or JSON document and the expanded desired state
/// comes back in the same encoding. Captures already present in `cache` are
/// reused with their original timestamps, fresh ones are stamped with the
/// current time. Nothing is returned on failure.
///
/// ```
/// use nmpolicy_core::{generate_state, CachedState, PolicySpec};
///
/// let generated = generate_state(&PolicySpec::default(), b"", &CachedState::no_cache()).unwrap();
/// assert!(generated.desired_state.is_empty());
/// assert!(generated.cache.capture.is_empty());
/// ```
pub fn generate_state(
    policy: &PolicySpec,
    current_state: &[u8],
    cache: &CachedState,
) -> Result<GeneratedState, GenerateError> {
    generate_state_at(policy, current_state, cache, Utc::now())
}

/// [`generate_state`] with an explicit clock.
pub fn generate_state_at(
    policy: &PolicySpec,
    current_state: &[u8],
    cache: &CachedState,
    now: DateTime<Utc>,
) -> Result<GeneratedState, GenerateError> {
    let meta_info = MetaInfo::stamped(now);
    if policy.desired_state.is_null() {
        debug!("policy has no desired state, nothing to generate");
        return Ok(GeneratedState {
            meta_info,
            ..GeneratedState::default()
        });
    }

    let (state, encoding) = decode_state(current_state).map_err(GenerateError::Decode)?;
    if state.is_null() {
        let unresolved: Vec<String> = policy
            .capture
            .keys()
            .filter(|capture_id| !cache.capture.contains_key(*capture_id))
            .cloned()
            .collect();
        if !unresolved.is_empty() {
            return Err(GenerateError::MissingCurrentState(unresolved));
        }
    }

    let mut captured = Capture::new().resolve(&policy.capture, &cache.capture, &state)?;
    let desired_state =
        StateExpander::new(CaptureEntry::new(&captured)).expand(&policy.desired_state)?;

    for entry in captured.values_mut() {
        if entry.meta_info.time_stamp.is_none() {
            entry.meta_info = meta_info.clone();
        }
    }

    let desired_state = encoding
        .encode(&desired_state)
        .map_err(GenerateError::Encode)?;
    info!(
        captures = captured.len(),
        bytes = desired_state.len(),
        "generated desired state"
    );
    Ok(GeneratedState {
        cache: CachedState { capture: captured },
        desired_state,
        meta_info,
    })
}
