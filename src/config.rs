//! Build configuration.
//!
//! Handles loading, validating, and layering `marimushka.toml`. Three layers
//! are merged, later ones winning key by key:
//!
//! ```text
//! stock defaults  →  marimushka.toml  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output = "_site"                  # Output directory
//! template = ""                     # Index template; empty = bundled default
//! notebooks = "notebooks"           # Static HTML notebooks; empty = none
//! apps = "apps"                     # Run-only WASM apps; empty = none
//! notebooks_wasm = "notebooks_wasm" # Editable WASM notebooks; empty = none
//!
//! [converter]
//! command = ["uvx", "marimo"]       # Tool prefix before `export ...`
//! timeout_secs = 600                # Per-conversion limit, 0 = no limit
//!
//! [processing]
//! max_processes = 4                 # Parallel conversions (omit for auto = CPU cores)
//!
//! [index]
//! include_failed = false            # List notebooks whose export failed
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "marimushka.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything one build needs to know.
///
/// All fields have defaults; config files only specify what they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory.
    pub output: PathBuf,
    /// Index template file. Empty means the bundled template.
    pub template: PathBuf,
    /// Root of notebooks exported as static HTML.
    pub notebooks: PathBuf,
    /// Root of apps exported as run-only WASM.
    pub apps: PathBuf,
    /// Root of notebooks exported as editable WASM.
    pub notebooks_wasm: PathBuf,
    /// External converter settings.
    pub converter: ConverterConfig,
    /// Parallel conversion settings.
    pub processing: ProcessingConfig,
    /// Index rendering settings.
    pub index: IndexConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("_site"),
            template: PathBuf::new(),
            notebooks: PathBuf::from("notebooks"),
            apps: PathBuf::from("apps"),
            notebooks_wasm: PathBuf::from("notebooks_wasm"),
            converter: ConverterConfig::default(),
            processing: ProcessingConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.converter.command.first() {
            None => {
                return Err(ConfigError::Validation(
                    "converter.command must not be empty".into(),
                ));
            }
            Some(program) if program.trim().is_empty() => {
                return Err(ConfigError::Validation(
                    "converter.command program must not be blank".into(),
                ));
            }
            Some(_) => {}
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output must not be empty".into()));
        }
        Ok(())
    }

    /// The configured template, or `None` for the bundled one.
    pub fn template_path(&self) -> Option<&Path> {
        non_empty(&self.template)
    }
}

/// Treat an empty path as absent.
pub fn non_empty(path: &Path) -> Option<&Path> {
    (!path.as_os_str().is_empty()).then_some(path)
}

/// How the external tool is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Program and leading arguments, e.g. `["uvx", "marimo"]`.
    pub command: Vec<String>,
    /// Per-conversion timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: crate::kind::DEFAULT_TOOL
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 600,
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversions.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Which notebooks the index lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// List notebooks whose conversion failed. Their links will be broken.
    pub include_failed: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BuildConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge each overlay in order onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<BuildConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `path` (if it exists) over the stock defaults, then apply `cli` on top.
pub fn load_config(path: &Path, cli: Option<toml::Value>) -> Result<BuildConfig, ConfigError> {
    let file = load_raw_config(path)?;
    resolve_config(file.into_iter().chain(cli))
}

/// Returns a fully-commented stock `marimushka.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Marimushka Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override this file.
# Unknown keys will cause an error.

# Directory that receives index.html and the exported files.
output = "_site"

# Jinja template for index.html. It receives three lists, `notebooks`,
# `apps` and `notebooks_wasm`, whose items have `display_name`, `html_path`
# and `kind`. Leave empty to use the bundled template.
template = ""

# Source roots, searched recursively for *.py files.
# An empty string disables a category; a missing directory contributes nothing.
notebooks = "notebooks"            # exported as static HTML
apps = "apps"                      # exported as WASM, run mode, code hidden
notebooks_wasm = "notebooks_wasm"  # exported as WASM, edit mode

# ---------------------------------------------------------------------------
# External converter
# ---------------------------------------------------------------------------
[converter]
# Program and leading arguments. The kind's export arguments, the source
# path, `-o` and the output path are appended.
command = ["uvx", "marimo"]

# Kill a conversion that runs longer than this many seconds. 0 = no limit.
timeout_secs = 600

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversions. Omit to use all CPU cores.
# Values larger than the core count are clamped down.
# max_processes = 4

# ---------------------------------------------------------------------------
# Index
# ---------------------------------------------------------------------------
[index]
# Also list notebooks whose export failed (their links will not resolve).
include_failed = false
"##
}
