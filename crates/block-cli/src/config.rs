//! Layered configuration for the `blocks` command
//!
//! Configuration is read from a hierarchy of TOML files, later layers
//! overriding earlier ones key by key:
//!
//! 1. Built-in defaults
//! 2. User config (`<config_dir>/blocks/config.toml`)
//! 3. Project config (`./blocks.toml`)
//! 4. An explicit `--config <path>`
//!
//! Command-line flags are applied on top by the caller.
//!
//! ```toml
//! [parse]
//! skip_autop = false
//!
//! [raw]
//! mode = "auto"
//! allow_unfiltered_html = false
//! target_tag = "p"
//!
//! [serialize]
//! strip_core_namespace = true
//!
//! [log]
//! level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use block_model::{ParseOptions, SerializeOptions};
use block_raw::{RawInput, RawMode};
use serde::{Deserialize, Serialize};
use toml::Table;

use crate::error::ConfigError;

/// File name of the project layer.
pub const PROJECT_CONFIG: &str = "blocks.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Leave freeform content without added paragraphs.
    pub skip_autop: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub mode: RawMode,
    pub allow_unfiltered_html: bool,
    pub target_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeConfig {
    pub strip_core_namespace: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            strip_core_namespace: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// The effective configuration after all layers are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parse: ParseConfig,
    pub raw: RawConfig,
    pub serialize: SerializeConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            skip_autop: self.parse.skip_autop,
        }
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            strip_core_namespace: self.serialize.strip_core_namespace,
        }
    }

    /// Raw handler input carrying the configured mode and filtering.
    pub fn raw_input(&self, html: String, plain_text: Option<String>) -> RawInput {
        RawInput {
            html,
            plain_text,
            mode: self.raw.mode,
            target_tag: self.raw.target_tag.clone(),
            allow_unfiltered_html: self.raw.allow_unfiltered_html,
        }
    }
}

/// Overlays `layer` onto `base`, merging nested tables key by key.
fn merge_tables(base: &mut Table, layer: Table) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => merge_tables(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn read_layer(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves configuration by merging the configured layers.
pub struct ConfigResolver {
    working_dir: PathBuf,
    explicit: Option<PathBuf>,
    /// Override for the user config directory (used for testing).
    user_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver reading the project layer from `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            explicit: None,
            user_config_dir_override: None,
        }
    }

    /// Add an explicit configuration file as the last layer.
    ///
    /// Unlike the discovered layers, a missing explicit file is an error.
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Use `dir` instead of the platform config directory for the user layer.
    pub fn with_user_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_config_dir_override = Some(dir.into());
        self
    }

    fn user_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.user_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("blocks"))
    }

    /// Discovered layer files, in merge order, whether or not they exist.
    pub fn layer_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = self.user_config_dir() {
            paths.push(dir.join("config.toml"));
        }
        paths.push(self.working_dir.join(PROJECT_CONFIG));
        paths
    }

    /// Merge all layers over the defaults.
    ///
    /// Missing discovered layers are skipped. Invalid TOML in any layer, or
    /// a value of the wrong shape, is an error.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut merged = Table::new();

        for path in self.layer_paths() {
            if path.is_file() {
                tracing::debug!(?path, "Loading configuration layer");
                merge_tables(&mut merged, read_layer(&path)?);
            } else {
                tracing::debug!(?path, "No configuration layer found, skipping");
            }
        }

        if let Some(ref path) = self.explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            tracing::debug!(?path, "Loading explicit configuration");
            merge_tables(&mut merged, read_layer(path)?);
        }

        Ok(toml::Value::Table(merged).try_into()?)
    }
}
