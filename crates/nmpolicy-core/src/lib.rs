//! # NMPolicy Core
//!
//! Generates a network desired state from a policy and the current state of
//! a node. A policy names capture expressions that select parts of the
//! current state and provides a desired-state template whose
//! `"{{ capture.path }}"` leaves are replaced with the captured values.
//!
//! ```
//! use nmpolicy_core::{generate_state, CachedState, PolicySpec};
//! use serde_json::json;
//!
//! let policy = PolicySpec {
//!     capture: [(
//!         "default-gw".to_string(),
//!         r#"routes.running.destination=="0.0.0.0/0""#.to_string(),
//!     )]
//!     .into(),
//!     desired_state: json!({
//!         "interfaces": [{
//!             "name": "br1",
//!             "bridge": {"port": [{
//!                 "name": "{{ capture.default-gw.routes.running.0.next-hop-interface }}"
//!             }]}
//!         }]
//!     }),
//! };
//! let current_state = br#"
//! routes:
//!   running:
//!   - destination: 0.0.0.0/0
//!     next-hop-interface: eth1
//! "#;
//!
//! let generated = generate_state(&policy, current_state, &CachedState::no_cache()).unwrap();
//! let desired = String::from_utf8(generated.desired_state).unwrap();
//! assert!(desired.contains("name: eth1"));
//! assert!(generated.cache.capture.contains_key("default-gw"));
//! ```
//!
//! Everything is a pure function of its inputs. Captures found in the cache
//! are never evaluated again, so callers persist [`GeneratedState::cache`]
//! and pass it back on the next run.

#![forbid(unsafe_code)]

pub mod capture;
pub mod encoding;
pub mod error;
pub mod expander;
pub mod resolver;
pub mod types;

mod generate;

pub use capture::{Capture, CaptureEntry, ExpressionLexer, ExpressionParser};
pub use encoding::{decode_state, Encoding};
pub use error::{
    CaptureEntryError, CaptureError, DocumentError, ExpandError, ExpressionResolveError,
    GenerateError, ResolveError,
};
pub use expander::{CapturePathResolver, StateExpander};
pub use generate::{generate_state, generate_state_at};
pub use resolver::Resolver;
pub use types::{
    CaptureAstPool, CaptureExpressions, CachedState, CapturedState, CapturedStates,
    GeneratedState, MetaInfo, PolicySpec, State, POLICY_VERSION,
};

/// Returns the version of the crate as defined in Cargo.toml.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
