//! Configuration for the `nmpolicy` binary.
//!
//! Values come from an optional `nmpolicy.yaml` (or the file given with
//! `--config`) and are overridden by `NMPOLICY_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "nmpolicy";

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "NMPOLICY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default tracing filter, `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Format of documents printed by `capture` and `parse`
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            log_level: default_log_level(),
            output_format: OutputFormat::default(),
        }
    }
}

impl CliConfig {
    /// Load the configuration. An explicit `path` must exist, the default
    /// file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}
