//! Data model shared by the capture engine and its callers.
//!
//! Field names follow the persisted form of a policy (`capture`,
//! `desiredState`, `metaInfo`, ...) so that a cache written by one run can be
//! fed back verbatim into the next.

use chrono::{DateTime, Utc};
use nmpolicy_dsl::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded YAML or JSON document.
pub type State = serde_json::Value;

/// Capture-id to expression string.
pub type CaptureExpressions = BTreeMap<String, String>;

/// Capture-id to resolved value.
pub type CapturedStates = BTreeMap<String, CapturedState>;

/// Capture-id to parsed expression. Built per invocation, never persisted.
pub type CaptureAstPool = BTreeMap<String, Node>;

/// Version stamped into every [`MetaInfo`] produced by this crate.
pub const POLICY_VERSION: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetaInfo {
    #[serde(default)]
    pub version: String,

    /// Unset until the capture has been stamped by `generate_state`
    #[serde(rename = "time", default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<DateTime<Utc>>,
}

impl MetaInfo {
    pub fn stamped(time_stamp: DateTime<Utc>) -> Self {
        MetaInfo {
            version: POLICY_VERSION.to_string(),
            time_stamp: Some(time_stamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapturedState {
    #[serde(default)]
    pub state: State,

    #[serde(rename = "metaInfo", default)]
    pub meta_info: MetaInfo,
}

impl CapturedState {
    /// A freshly resolved capture, not stamped yet.
    pub fn new(state: State) -> Self {
        CapturedState {
            state,
            meta_info: MetaInfo::default(),
        }
    }
}

/// Captures persisted between invocations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CachedState {
    #[serde(default)]
    pub capture: CapturedStates,
}

impl CachedState {
    pub fn no_cache() -> Self {
        CachedState::default()
    }

    pub fn is_empty(&self) -> bool {
        self.capture.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicySpec {
    #[serde(default)]
    pub capture: CaptureExpressions,

    /// Template whose `"{{ expr }}"` leaves are expanded from the captures
    #[serde(rename = "desiredState", default)]
    pub desired_state: State,
}

/// Output of `generate_state`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedState {
    /// Every capture requested by the policy, ready to be persisted
    pub cache: CachedState,

    /// Expanded desired state, encoded like the current state
    pub desired_state: Vec<u8>,

    pub meta_info: MetaInfo,
}
