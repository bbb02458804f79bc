//! Library side of the `nmpolicy` binary.
//!
//! Each subcommand is a function that reads its inputs from disk and returns
//! the bytes to print, so they can be exercised without spawning a process.

#![forbid(unsafe_code)]

pub mod config;

use anyhow::{Context, Result};
use nmpolicy_core::{
    decode_state, generate_state, CachedState, Capture, CaptureExpressions, CapturedStates,
    PolicySpec, State,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

pub use config::{CliConfig, OutputFormat};

/// Capture-id used for the single expression of the `capture` subcommand.
pub const CLI_CAPTURE_ID: &str = "expression";

/// Install the fmt subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Paths taken by the `generate` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct GenerateFiles<'a> {
    pub policy: &'a Path,
    pub current_state: &'a Path,
    pub cache: Option<&'a Path>,
    pub cache_out: Option<&'a Path>,
}

/// Run `generate_state` over files and return the expanded desired state.
pub fn generate(files: GenerateFiles<'_>) -> Result<Vec<u8>> {
    let policy: PolicySpec = read_yaml(files.policy).context("Failed to load policy")?;
    let current_state = fs::read(files.current_state).with_context(|| {
        format!(
            "Failed to read current state from {}",
            files.current_state.display()
        )
    })?;
    let cache = match files.cache {
        Some(path) => read_yaml(path).context("Failed to load cache")?,
        None => CachedState::no_cache(),
    };
    debug!(
        captures = policy.capture.len(),
        cached = cache.capture.len(),
        "loaded policy"
    );

    let generated =
        generate_state(&policy, &current_state, &cache).context("Failed to generate state")?;

    if let Some(path) = files.cache_out {
        let cache = serde_yaml::to_string(&generated.cache).context("Failed to encode cache")?;
        fs::write(path, cache)
            .with_context(|| format!("Failed to write cache to {}", path.display()))?;
        info!(path = %path.display(), "wrote cache");
    }
    Ok(generated.desired_state)
}

/// Resolve one expression against the current state.
pub fn capture(expression: &str, current_state: &Path, format: OutputFormat) -> Result<String> {
    let bytes = fs::read(current_state).with_context(|| {
        format!("Failed to read current state from {}", current_state.display())
    })?;
    let (state, _) = decode_state(&bytes).context("Failed to decode current state")?;

    let requested: CaptureExpressions =
        [(CLI_CAPTURE_ID.to_string(), expression.to_string())].into();
    let mut captured = Capture::new()
        .resolve(&requested, &CapturedStates::new(), &state)
        .context("Failed to resolve expression")?;
    let result = captured
        .remove(CLI_CAPTURE_ID)
        .map(|entry| entry.state)
        .unwrap_or(State::Null);
    render(&result, format)
}

/// Parse one expression and render its AST.
pub fn parse(expression: &str, format: OutputFormat) -> Result<String> {
    let node = nmpolicy_dsl::parse_expression(expression).context("Failed to parse expression")?;
    render(&node, format)
}

/// Serialize a value in the requested output format.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_formats() {
        let value = json!({"name": "eth1"});
        assert_eq!(render(&value, OutputFormat::Yaml).unwrap(), "name: eth1\n");
        assert_eq!(
            render(&value, OutputFormat::Json).unwrap(),
            "{\n  \"name\": \"eth1\"\n}\n"
        );
    }

    #[test]
    fn test_parse_renders_ast() {
        let rendered = parse("routes.running", OutputFormat::Json).unwrap();
        let ast: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(ast["path"][1]["identity"], json!("running"));
    }

    #[test]
    fn test_parse_error_has_context() {
        let err = parse("routes..running", OutputFormat::Yaml).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse expression");
        assert!(format!("{:#}", err).contains("missing identity or number after dot"));
    }
}
